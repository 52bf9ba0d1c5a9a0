//! Natural-language instructions sent to the model.

/// Instruction for the home recommendation list.
pub const HOME_RECOMMENDATIONS: &str = "生成8个近期性价比商品推荐。";

/// Number of items the home recommendation prompt asks for.
pub const HOME_RECOMMENDATION_COUNT: usize = 8;

/// Builds the deal analysis instruction around the raw user query.
pub fn deal_analysis(query: &str) -> String {
    let mut prompt = String::from("你是省钱专家“好享省”AI。分析需求：");
    prompt.push_str(query);
    prompt.push_str(
        "\n\n请给出两个对比方案：\
         \n1. immediate：现在就能执行的最低到手价方案，按顺序列出领券、凑单、支付优惠等步骤；\
         \n2. future：预测下一个大促节点的极致省钱方案，说明需要等待多久（waitTime）。\
         \n同时给出近期价格走势（priceTrends，按日期升序）、下一次大促的价格预测与现在买还是等等的建议（buyNowOrWait），\
         以及2-3个同类替代商品（similarRecommendations）。所有价格以人民币元为单位。",
    );
    prompt
}
