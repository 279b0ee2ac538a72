/// Splits `text` into whitespace-joined groups of words.
///
/// Each word costs its length plus one separator; a chunk is closed as soon as
/// its cost reaches `chunk_chars`. Lengths are counted in characters, so a
/// single word longer than the limit becomes a chunk of its own.
pub fn chunk_words(text: &str, chunk_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        current.push(word);
        current_len += word.chars().count() + 1;

        if current_len >= chunk_chars {
            chunks.push(current.join(" "));
            current.clear();
            current_len = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
