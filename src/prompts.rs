// prompts.rs

/// Title and content pair fed into the digest prompt.
pub struct PromptArticle<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

pub fn digest_prompt(articles: &[PromptArticle<'_>]) -> String {
    let mut prompt = String::from(
        "\
You are a professional news analyst. You MUST provide individual summaries for EACH article first, then an overall summary.

CRITICAL REQUIREMENTS:
1. You MUST start with individual article summaries (Article 1:, Article 2:, etc.)
2. You MUST provide 3 bullet points for each individual article
3. You MUST end with \"All Articles Summary:\" section
4. DO NOT skip individual articles or go straight to the overall summary
5. DO NOT start bullet points with phrases like \"The article\", \"This article\", \"The story\", etc.
6. Write bullet points as direct statements of facts, insights, or implications

REQUIRED FORMAT (you MUST follow this exactly):
Article 1:
- Key insight with data/context
- Additional important detail
- Additional important detail

Article 2:
- Key insight with data/context
- Additional important detail
- Additional important detail

[Continue for each article...]

All Articles Summary:
- Main theme or trend across articles
- Additional synthesis point
- Additional synthesis point
- Final insight if relevant

Articles to summarize:
",
    );

    for (idx, article) in articles.iter().enumerate() {
        prompt.push_str(&format!(
            "\nArticle {} Title: {}\nContent: {}",
            idx + 1,
            article.title,
            article.content
        ));
    }

    prompt.push_str("\n\nSummaries:");
    prompt
}

pub fn topic_synthesis_prompt(topic: &str, bullet_points: &[String]) -> String {
    let mut prompt = format!(
        "\
You are a professional news analyst. Below are bullet points from multiple articles about {topic}.

Your task is to synthesize these bullet points into 3-4 concise, insightful bullet points that capture the key themes, trends, and implications for {topic}.

CRITICAL REQUIREMENTS:
1. DO NOT start bullet points with phrases like \"The article\", \"This article\", \"The story\", etc.
2. Write bullet points as direct statements of facts, insights, or implications
3. Focus on synthesizing the information, not describing individual articles
4. Identify common themes and patterns across the bullet points
5. Provide actionable insights and implications

Original bullet points for {topic}:
"
    );

    for (i, bullet) in bullet_points.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, bullet));
    }

    prompt.push_str(&format!(
        "\n\nSynthesized bullet points for {topic}:\n\u{2022} "
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_prompt_numbers_each_article() {
        let articles = [
            PromptArticle {
                title: "Fed Raises Rates",
                content: "The Federal Reserve raised rates by 25 basis points.",
            },
            PromptArticle {
                title: "Oil Prices Drop",
                content: "Crude fell 3% on demand concerns.",
            },
        ];
        let prompt = digest_prompt(&articles);
        assert!(prompt.contains("Article 1 Title: Fed Raises Rates"));
        assert!(prompt.contains("Article 2 Title: Oil Prices Drop"));
        assert!(prompt.ends_with("Summaries:"));
    }

    #[test]
    fn synthesis_prompt_numbers_bullets_and_names_the_topic() {
        let bullets = vec!["Rates rose.".to_string(), "Markets dipped.".to_string()];
        let prompt = topic_synthesis_prompt("interest rates", &bullets);
        assert!(prompt.contains("about interest rates"));
        assert!(prompt.contains("1. Rates rose.\n2. Markets dipped.\n"));
        assert!(prompt.ends_with("Synthesized bullet points for interest rates:\n\u{2022} "));
    }
}
