use tracing::debug;

use crate::schema::{Post, Reference};

/// Strip embedded mention handles, links and media references from a post.
///
/// Categories are applied in a fixed order (mentions, links, media); each
/// referenced substring is replaced with a single space. Remaining `@`
/// markers are removed last. A category that is absent, or that holds a
/// reference without a substring, is skipped as a whole.
///
/// Dropping an `@` can join a referenced substring back together, so the
/// passes repeat until the text stops changing.
pub fn sanitize(mut post: Post) -> Post {
    let mut text = std::mem::take(&mut post.text);

    loop {
        let before = text.clone();

        text = remove_noise(post.id, text, "user_mentions", post.entities.user_mentions.as_deref());
        text = remove_noise(post.id, text, "urls", post.entities.urls.as_deref());
        text = remove_noise(post.id, text, "media", post.entities.media.as_deref());
        text = text.replace('@', "");

        // Each change shortens the text or removes a non-space character
        if text == before {
            break;
        }
    }

    post.text = text;
    post
}

fn remove_noise<R: Reference>(
    post_id: u64,
    text: String,
    category: &str,
    references: Option<&[R]>,
) -> String {
    let Some(references) = references else {
        return text;
    };

    // All-or-nothing per category
    let substrings: Option<Vec<&str>> = references.iter().map(|r| r.replaceable()).collect();
    let Some(substrings) = substrings else {
        debug!(post_id, category, "Skipping malformed entity category");
        return text;
    };

    substrings
        .into_iter()
        .filter(|s| !s.is_empty())
        .fold(text, |acc, s| acc.replace(s, " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Entities, MediaEntity, UrlEntity, UserMention};

    fn post(text: &str, entities: Entities) -> Post {
        Post {
            id: 11,
            author: "carol".to_string(),
            text: text.to_string(),
            entities,
        }
    }

    fn mention(name: &str) -> UserMention {
        UserMention { screen_name: Some(name.to_string()) }
    }

    fn url(u: &str) -> UrlEntity {
        UrlEntity { url: Some(u.to_string()), expanded_url: None }
    }

    #[test]
    fn test_strips_every_category() {
        let entities = Entities {
            user_mentions: Some(vec![mention("bob")]),
            urls: Some(vec![url("https://t.co/abc")]),
            media: Some(vec![MediaEntity {
                url: Some("https://t.co/pic".to_string()),
                media_url_https: None,
            }]),
        };
        let cleaned = sanitize(post("@bob loving it https://t.co/abc https://t.co/pic", entities));

        assert!(!cleaned.text.contains("bob"));
        assert!(!cleaned.text.contains("https://t.co/abc"));
        assert!(!cleaned.text.contains("https://t.co/pic"));
        assert!(!cleaned.text.contains('@'));
        assert!(cleaned.text.contains("loving it"));
        assert_eq!(cleaned.id, 11);
        assert_eq!(cleaned.author, "carol");
    }

    #[test]
    fn test_no_references_only_drops_at_signs() {
        let cleaned = sanitize(post("mail me @ home", Entities::default()));
        assert_eq!(cleaned.text, "mail me  home");
    }

    #[test]
    fn test_malformed_category_is_skipped() {
        let entities = Entities {
            user_mentions: Some(vec![mention("bob")]),
            urls: Some(vec![url("https://t.co/a"), UrlEntity::default()]),
            media: None,
        };
        let cleaned = sanitize(post("@bob see https://t.co/a", entities));

        // Mentions still applied, links left alone
        assert_eq!(cleaned.text, "  see https://t.co/a");
    }

    #[test]
    fn test_idempotent() {
        let entities = Entities {
            user_mentions: Some(vec![mention("dave"), mention("erin")]),
            urls: Some(vec![url("https://t.co/q")]),
            media: None,
        };
        let once = sanitize(post("@dave and @erin read https://t.co/q !", entities));
        let twice = sanitize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_at_inside_reference_does_not_rebuild_it() {
        let entities = Entities {
            user_mentions: Some(vec![mention("bob")]),
            urls: None,
            media: None,
        };
        let once = sanitize(post("hi b@ob", entities));
        let twice = sanitize(once.clone());

        assert!(!once.text.contains("bob"));
        assert_eq!(once.text, "hi  ");
        assert_eq!(once, twice);
    }
}
