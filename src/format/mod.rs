//! Output formatting for analyses, recommendations and history (table, JSON, markdown, CSV).

use crate::analysis::{DealAnalysisResponse, HomeRecommendation, PlanType, SavingPlan};
use crate::config::OutputFormat;

/// Truncates to `max` characters, appending "..." when shortened.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn plan_badge(plan: &SavingPlan) -> &'static str {
    match plan.plan_type {
        PlanType::Immediate => "立即可行",
        PlanType::Future => "极致预测",
    }
}

/// Formats results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a deal analysis.
    pub fn format_analysis(&self, analysis: &DealAnalysisResponse) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(analysis).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => self.table_analysis(analysis),
            OutputFormat::Markdown => self.markdown_analysis(analysis),
            OutputFormat::Csv => self.csv_plans(&analysis.plans),
        }
    }

    /// Formats home recommendations.
    pub fn format_recommendations(&self, recommendations: &[HomeRecommendation]) -> String {
        if recommendations.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_recommendation_header(),
                _ => "暂无推荐".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(recommendations).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_recommendations(recommendations),
            OutputFormat::Markdown => self.markdown_recommendations(recommendations),
            OutputFormat::Csv => self.csv_recommendations(recommendations),
        }
    }

    /// Formats search history entries.
    pub fn format_history(&self, entries: &[String]) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(entries).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Csv => {
                let mut lines = vec!["query".to_string()];
                lines.extend(entries.iter().map(|e| csv_field(e)));
                lines.join("\n")
            }
            _ if entries.is_empty() => "No search history.".to_string(),
            OutputFormat::Markdown => {
                entries.iter().map(|e| format!("- {}", e)).collect::<Vec<_>>().join("\n")
            }
            OutputFormat::Table => entries
                .iter()
                .enumerate()
                .map(|(i, e)| format!("{:>2}. {}", i + 1, e))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    // Table formatting

    fn table_analysis(&self, analysis: &DealAnalysisResponse) -> String {
        let mut lines = Vec::new();
        let product = &analysis.product_details;

        lines.push(format!("商品:    {}", product.name));
        lines.push(format!("平台:    {}", product.platform));
        let price_line = match product.discount_percent() {
            Some(pct) => format!(
                "价格:    ¥{:.2} (原价 ¥{:.2}, -{}%)",
                product.current_price, product.original_price, pct
            ),
            None => format!("价格:    ¥{:.2}", product.current_price),
        };
        lines.push(price_line);

        for (idx, plan) in analysis.plans.iter().enumerate() {
            lines.push(String::new());
            let marker = if idx == 0 { "*" } else { " " };
            lines.push(format!(
                "{} [{}] {}  到手价 ¥{:.2}  省 ¥{:.2}",
                marker,
                plan_badge(plan),
                plan.label,
                plan.final_price,
                plan.total_savings
            ));
            if let Some(wait) = &plan.wait_time {
                lines.push(format!("    等待: {}", wait));
            }
            for (step_idx, step) in plan.steps.iter().enumerate() {
                match plan.coupon_for_step(step_idx) {
                    Some(coupon) => lines.push(format!("    {}. {} [{}]", step_idx + 1, step, coupon)),
                    None => lines.push(format!("    {}. {}", step_idx + 1, step)),
                }
            }
            if let Some(explanation) = &plan.explanation {
                lines.push(format!("    说明: {}", explanation));
            }
        }

        let prediction = &analysis.price_prediction;
        lines.push(String::new());
        lines.push(format!(
            "预测:    {} 预计 ¥{:.2} (降 ¥{:.2}, 置信度 {:.0}%)",
            prediction.next_event_name,
            prediction.expected_price,
            prediction.expected_drop,
            prediction.confidence
        ));
        lines.push(format!("建议:    {}", prediction.buy_now_or_wait.label()));
        if !prediction.reasoning.is_empty() {
            lines.push(format!("理由:    {}", prediction.reasoning));
        }

        if !analysis.price_trends.is_empty() {
            lines.push(String::new());
            lines.push("价格走势:".to_string());
            let lowest = analysis.lowest_trend_price().map(|p| p.price);
            for point in &analysis.price_trends {
                let flag = if Some(point.price) == lowest { "  <- 最低" } else { "" };
                lines.push(format!("  {:<12} ¥{:>10.2}{}", point.date, point.price, flag));
            }
        }

        if !analysis.similar_recommendations.is_empty() {
            lines.push(String::new());
            lines.push("同类推荐:".to_string());
            for similar in &analysis.similar_recommendations {
                lines.push(format!(
                    "  {} ({}) ¥{:.2}  {}",
                    truncate(&similar.name, 30),
                    similar.platform,
                    similar.price,
                    similar.advantage
                ));
            }
        }

        lines.push(String::new());
        lines.push(format!("AI 决策建议: {}", analysis.decision_advice));

        lines.join("\n")
    }

    fn table_recommendations(&self, recommendations: &[HomeRecommendation]) -> String {
        let name_width = 24;
        let mut lines = Vec::new();

        lines.push(format!(
            "{:<4}  {:<6}  {:>10}  {:>10}  {:<name_width$}  {}",
            "分类", "平台", "价格", "原价", "商品", "理由"
        ));
        lines.push(format!("{:-<4}  {:-<6}  {:-<10}  {:-<10}  {:-<name_width$}  {:-<10}", "", "", "", "", "", ""));

        for rec in recommendations {
            lines.push(format!(
                "{:<4}  {:<6}  {:>10.2}  {:>10.2}  {:<name_width$}  {}",
                rec.category.as_str(),
                rec.platform.as_str(),
                rec.price,
                rec.original_price,
                truncate(&rec.name, name_width),
                rec.reason
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} recommendations", recommendations.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_analysis(&self, analysis: &DealAnalysisResponse) -> String {
        let mut lines = Vec::new();
        let product = &analysis.product_details;

        lines.push(format!("## {}", product.name));
        lines.push(String::new());
        lines.push(format!("![{}]({})", product.name, product.image()));
        lines.push(String::new());
        lines.push(format!("- **平台:** {}", product.platform));
        lines.push(format!(
            "- **价格:** ¥{:.2} ~~¥{:.2}~~",
            product.current_price, product.original_price
        ));

        lines.push(String::new());
        lines.push("### 省钱方案".to_string());
        for plan in &analysis.plans {
            lines.push(String::new());
            lines.push(format!("#### {} ({})", plan.label, plan_badge(plan)));
            lines.push(format!(
                "到手价 **¥{:.2}**，共省 ¥{:.2}",
                plan.final_price, plan.total_savings
            ));
            if let Some(wait) = &plan.wait_time {
                lines.push(format!("> {}", wait));
            }
            for (idx, step) in plan.steps.iter().enumerate() {
                match plan.coupon_for_step(idx) {
                    Some(coupon) => lines.push(format!("{}. {} `{}`", idx + 1, step, coupon)),
                    None => lines.push(format!("{}. {}", idx + 1, step)),
                }
            }
        }

        let prediction = &analysis.price_prediction;
        lines.push(String::new());
        lines.push("### 价格预测".to_string());
        lines.push(format!(
            "- **{}:** ¥{:.2} (置信度 {:.0}%)",
            prediction.next_event_name, prediction.expected_price, prediction.confidence
        ));
        lines.push(format!("- **建议:** {}", prediction.buy_now_or_wait.label()));

        if !analysis.price_trends.is_empty() {
            lines.push(String::new());
            lines.push("| 日期 | 价格 |".to_string());
            lines.push("|------|------|".to_string());
            for point in &analysis.price_trends {
                lines.push(format!("| {} | {:.2} |", point.date, point.price));
            }
        }

        if !analysis.similar_recommendations.is_empty() {
            lines.push(String::new());
            lines.push("### 同类推荐".to_string());
            for similar in &analysis.similar_recommendations {
                let name = match &similar.link {
                    Some(link) => format!("[{}]({})", similar.name, link),
                    None => similar.name.clone(),
                };
                lines.push(format!(
                    "- {} ({}) ¥{:.2} {}",
                    name, similar.platform, similar.price, similar.advantage
                ));
            }
        }

        lines.push(String::new());
        lines.push(format!("*{}*", analysis.decision_advice));

        lines.join("\n")
    }

    fn markdown_recommendations(&self, recommendations: &[HomeRecommendation]) -> String {
        let mut lines = Vec::new();

        lines.push("| 分类 | 平台 | 价格 | 原价 | 商品 | 理由 |".to_string());
        lines.push("|------|------|------|------|------|------|".to_string());

        for rec in recommendations {
            lines.push(format!(
                "| {} | {} | {:.2} | ~~{:.2}~~ | [{}]({}) | {} |",
                rec.category,
                rec.platform,
                rec.price,
                rec.original_price,
                truncate(&rec.name, 40),
                rec.image(),
                rec.reason
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} recommendations*", recommendations.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_plans(&self, plans: &[SavingPlan]) -> String {
        let mut lines = vec!["type,label,final_price,total_savings,wait_time,steps".to_string()];

        for plan in plans {
            lines.push(format!(
                "{},{},{},{},{},{}",
                plan.plan_type,
                csv_field(&plan.label),
                plan.final_price,
                plan.total_savings,
                csv_field(plan.wait_time.as_deref().unwrap_or_default()),
                csv_field(&plan.steps.join(" | "))
            ));
        }

        lines.join("\n")
    }

    fn csv_recommendation_header(&self) -> String {
        "name,category,price,original_price,platform,reason,image_seed".to_string()
    }

    fn csv_recommendations(&self, recommendations: &[HomeRecommendation]) -> String {
        let mut lines = vec![self.csv_recommendation_header()];

        for rec in recommendations {
            lines.push(format!(
                "{},{},{},{},{},{},{}",
                csv_field(&rec.name),
                rec.category,
                rec.price,
                rec.original_price,
                rec.platform,
                csv_field(&rec.reason),
                csv_field(&rec.image_seed)
            ));
        }

        lines.join("\n")
    }
}
