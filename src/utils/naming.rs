use chrono::Utc;
use rand::Rng;
use std::path::Path;

/// Longest extension carried over onto the stored name
const MAX_EXTENSION_LEN: usize = 10;

/// Synthesizes a unique name for the storage backend:
/// millisecond timestamp plus nine digits of random entropy, keeping the
/// original file's extension so the bytes on disk stay recognizable.
///
/// Example: `file-1679347200000-004837261.png`
pub fn generate_stored_name(original_name: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let entropy: u32 = rand::thread_rng().gen_range(0..1_000_000_000);

    match file_extension(original_name) {
        Some(ext) => format!("file-{}-{:09}.{}", timestamp, entropy, ext),
        None => format!("file-{}-{:09}", timestamp, entropy),
    }
}

/// Extension of the original filename, normalized for use on disk:
/// ASCII alphanumeric only, lowercased, length-capped.
fn file_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension().and_then(|e| e.to_str())?;

    let normalized: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(MAX_EXTENSION_LEN)
        .collect::<String>()
        .to_lowercase();

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_name_shape() {
        let name = generate_stored_name("photo.PNG");
        assert!(name.starts_with("file-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_stored_name_without_extension() {
        let name = generate_stored_name("README");
        assert!(name.starts_with("file-"));
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_stored_names_differ() {
        let a = generate_stored_name("a.pdf");
        let b = generate_stored_name("a.pdf");
        assert_ne!(a, b);
    }

    #[test]
    fn test_extension_normalization() {
        assert_eq!(file_extension("a.TAR"), Some("tar".to_string()));
        assert_eq!(file_extension("weird.p@d!f"), Some("pdf".to_string()));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }
}
