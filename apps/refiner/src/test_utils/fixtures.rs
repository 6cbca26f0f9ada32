use chrono::Utc;
use uuid::Uuid;

use crate::models::content::{ContentItem, ContentStatus, TargetProfile};
use crate::scoring::text::Document;

pub const TITLE: &str = "Cold Brew at Home: A Complete Beginner Guide";

/// Dense single paragraph; reading ease clamps to 0.
pub const DENSE_BODY: &str = "Steeping coarsely ground beans in refrigerated water produces a \
considerably mellower concentrate. Extraction proceeds gradually over an extended interval, \
typically overnight, preserving delicate aromatic compounds.";

/// Same subject as `DENSE_BODY` in plain words. Every other dimension scores the same.
pub const PLAIN_BODY: &str = "Cold brew is made by soaking ground beans in cold water for a \
long time. The slow soak pulls out less acid and keeps the taste smooth and sweet.";

pub const WELL_STRUCTURED_ARTICLE: &str = r#"Did you know cold brew can taste sweeter than hot coffee? You only need beans, water and a jar.

## What is cold brew?

Cold brew is a coffee made by steeping ground beans in cold water for twelve to eighteen hours. The result is smooth and low in bitterness.

## How do you make cold brew at home?

Mix one part coarse coffee with four parts water in a large jar. Stir it, cover it and leave it in the fridge overnight. Strain it through a paper filter in the morning.

- Use coarse grounds so the brew stays clear.
- Filtered water gives a cleaner taste.
- Dilute the concentrate with milk or water before you drink it.

## Why does cold brew taste smoother?

Cold water pulls fewer bitter compounds out of the beans. Your cup ends up mellow, a little sweet and easy to drink black.

| Method | Time | Taste |
| --- | --- | --- |
| Cold brew | 12 to 18 hours | Smooth |
| Iced coffee | 5 minutes | Sharp |

## Key takeaways

Cold brew is easy, cheap and forgiving. Pick a good bean, give it time and keep the jar cold.

Ready for a better cup? Sign up for our newsletter to get a new cold brew recipe every week."#;

pub fn content_item(body: &str) -> ContentItem {
    ContentItem {
        id: Uuid::new_v4(),
        title: TITLE.to_string(),
        body: body.to_string(),
        word_count: Document::parse(body).word_count() as u32,
        strategy_id: Uuid::new_v4(),
        status: ContentStatus::Draft,
        meta_description: None,
        target_reading_ease: None,
        updated_at: Utc::now(),
    }
}

pub fn target_profile(target: f64, keywords: &[&str]) -> TargetProfile {
    TargetProfile {
        strategy_id: Uuid::new_v4(),
        target_reading_ease: target,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        tone: None,
        audience: "consumer".to_string(),
    }
}

/// A generator reply in the structured form the rewrite prompt asks for.
pub fn json_reply(body: &str) -> String {
    serde_json::json!({ "body": body, "notes": "rewritten" }).to_string()
}
