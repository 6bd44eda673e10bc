use std::time::Duration;

use futures_util::stream::{self, BoxStream, StreamExt};

/// Splits `text` into pieces of at most `chunk_size` characters. Boundaries
/// always fall between chars, so multi-byte text is never cut mid-codepoint.
pub fn split_into_chunks(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    for (count, (offset, _)) in text.char_indices().enumerate() {
        if count > 0 && count % chunk_size == 0 {
            chunks.push(text[start..offset].to_string());
            start = offset;
        }
    }

    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    chunks
}

/// Yields `items` in order, waiting `delay` between consecutive items.
pub fn paced<T: Send + 'static>(items: Vec<T>, delay: Duration) -> BoxStream<'static, T> {
    stream::unfold(
        (items.into_iter(), true),
        move |(mut remaining, first)| async move {
            let item = remaining.next()?;
            if !first && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Some((item, (remaining, false)))
        },
    )
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_count_is_ceiling_of_length_over_size() {
        let text = "a".repeat(120);
        let chunks = split_into_chunks(&text, 50);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 50);
        assert_eq!(chunks[2].len(), 20);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_chunk() {
        let chunks = split_into_chunks(&"b".repeat(100), 50);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn short_and_empty_inputs() {
        assert_eq!(split_into_chunks("hello", 50), vec!["hello".to_string()]);
        assert!(split_into_chunks("", 50).is_empty());
    }

    #[test]
    fn multibyte_characters_stay_intact() {
        let text = "Grüße aus Heilbronn – schöne Woche! ".repeat(4);
        let chunks = split_into_chunks(&text, 7);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 7));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn zero_size_is_treated_as_one() {
        assert_eq!(split_into_chunks("abc", 0).len(), 3);
    }

    #[tokio::test]
    async fn paced_stream_preserves_order() {
        let items: Vec<u32> = paced(vec![1, 2, 3], Duration::ZERO).collect().await;
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn first_item_is_not_delayed() {
        let mut stream = paced(vec!["a", "b"], Duration::from_secs(5));
        let started = tokio::time::Instant::now();
        assert_eq!(stream.next().await, Some("a"));
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(stream.next().await, Some("b"));
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
