use std::path::Path;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates file size against the configured maximum
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }
    Ok(())
}

/// Validates the declared content type against the allow-list.
/// Returns the normalized essence (type/subtype, no parameters, lowercase).
///
/// The declared type is the contract; file content is not sniffed.
pub fn validate_mime_type(
    content_type: Option<&str>,
    allowed: &[String],
) -> Result<String, ValidationError> {
    let declared = content_type.unwrap_or("").trim();

    let parsed: mime::Mime = declared.parse().map_err(|_| ValidationError {
        code: "INVALID_MIME_TYPE",
        message: format!("Invalid file type: '{}'", declared),
    })?;

    let essence = parsed.essence_str().to_lowercase();

    if allowed.iter().any(|a| a == &essence) {
        return Ok(essence);
    }

    Err(ValidationError {
        code: "INVALID_MIME_TYPE",
        message: format!("Invalid file type: '{}' is not allowed", essence),
    })
}

/// Sanitizes the user-supplied filename for display and download-hint use.
/// Strips any path components and replaces control or reserved characters.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components in uploaded filename: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == '/'
                || c == '\\'
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec![
            "image/jpeg".to_string(),
            "image/png".to_string(),
            "application/pdf".to_string(),
            "application/zip".to_string(),
        ]
    }

    #[test]
    fn test_validate_file_size() {
        let max = 10 * 1024 * 1024;
        assert!(validate_file_size(1024, max).is_ok());
        assert!(validate_file_size(max, max).is_ok());
        assert!(validate_file_size(max + 1, max).is_err());
    }

    #[test]
    fn test_validate_mime_type() {
        assert_eq!(
            validate_mime_type(Some("image/jpeg"), &allowed()).unwrap(),
            "image/jpeg"
        );
        assert_eq!(
            validate_mime_type(Some("application/pdf; charset=binary"), &allowed()).unwrap(),
            "application/pdf"
        );
        assert_eq!(
            validate_mime_type(Some("IMAGE/PNG"), &allowed()).unwrap(),
            "image/png"
        );

        assert!(validate_mime_type(Some("text/html"), &allowed()).is_err());
        assert!(validate_mime_type(Some("application/javascript"), &allowed()).is_err());
        assert!(validate_mime_type(Some("not a mime"), &allowed()).is_err());
        assert!(validate_mime_type(None, &allowed()).is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test.pdf").unwrap(), "test.pdf");
        assert_eq!(sanitize_filename("my file.png").unwrap(), "my file.png");
        assert_eq!(
            sanitize_filename("test<script>.pdf").unwrap(),
            "test_script_.pdf"
        );
        assert_eq!(sanitize_filename("测试.zip").unwrap(), "测试.zip");

        // Path traversal collapses to the final component
        assert_eq!(sanitize_filename("../../../etc/passwd").unwrap(), "passwd");

        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("..").is_err());
    }
}
