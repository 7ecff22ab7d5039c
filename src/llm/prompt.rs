pub const SEPARATOR: &str = "\n\n---\n\n";

const TEMPLATE: &str = "\
You are a world-class AI assistant for analyzing product reviews.
I have provided you with {doc_count} reviews for a product.

Your task is to analyze them and provide a concise, actionable summary
for a product manager. Do not just list the reviews.

Please provide the following:
1.  **Positive Themes:** 2-3 key things users consistently loved.
2.  **Negative Themes:** 2-3 key problems or complaints users consistently had.
3.  **Actionable Insight:** One key suggestion for the product team.
4.  **Key Quotes:** 2-3 short, powerful quotes that exemplify the main themes.

REVIEWS:
{context}
";

/// Renders the analysis prompt for the given reviews.
pub fn render(reviews: &[String]) -> String {
    // Count first so review text containing the placeholder is left alone.
    TEMPLATE
        .replace("{doc_count}", &reviews.len().to_string())
        .replace("{context}", &reviews.join(SEPARATOR))
}
