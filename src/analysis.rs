use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};

use crate::models::Review;

/// A generative-text backend that turns a prompt into free text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Simple arithmetic mean of the review ratings; 0.0 when there are none.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    f64::from(total) / reviews.len() as f64
}

pub fn build_prompt(business_name: &str, reviews: &[Review]) -> String {
    let avg_rating = average_rating(reviews);
    let reviews_text = reviews
        .iter()
        .map(|review| format!("Rating: {}/5\nReview: {}\n", review.rating, review.text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "For {name} (Average Rating: {avg_rating:.1}/5):\n\
         \n\
         {reviews_text}\n\
         \n\
         Please provide:\n\
         1. A brief summary of the overall sentiment\n\
         2. A clear recommendation (Should someone visit {name}?)\n\
         3. Either a short reasoning for your recommendation OR 2-3 key pros and cons\n\
         \n\
         Keep your response concise and conversational.\n",
        name = business_name,
    )
}

/// Ask the model for a recommendation. Any failure is logged and yields `None`.
pub async fn analyze_reviews(
    provider: &dyn CompletionProvider,
    business_name: &str,
    reviews: &[Review],
) -> Option<String> {
    if reviews.is_empty() {
        return None;
    }

    info!("Analyzing {} reviews for {}", reviews.len(), business_name);
    let prompt = build_prompt(business_name, reviews);
    match provider.complete(&prompt).await {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Error getting AI analysis for {}: {:#}", business_name, e);
            None
        }
    }
}
