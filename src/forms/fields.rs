/// Decoded text fields of a form submission, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// First value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value under `name`, or an empty string when absent.
    pub fn text(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    /// Checkbox semantics: absent, empty, "false", "0" and "off" are unchecked.
    pub fn checked(&self, name: &str) -> bool {
        match self.get(name) {
            None => false,
            Some(v) => !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "" | "false" | "0" | "off"
            ),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A file part of a multipart submission, fully buffered.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Lowercased extension of the client-side file name, if it has a usable one.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext)
    }
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_first_value() {
        let fields: FormFields = [("a", "1"), ("a", "2")].into_iter().collect();
        assert_eq!(fields.get("a"), Some("1"));
        assert_eq!(fields.get("b"), None);
        assert_eq!(fields.text("b"), "");
    }

    #[test]
    fn checkbox_values() {
        let fields: FormFields = [("on", "on"), ("off", "false"), ("zero", "0"), ("blank", "")]
            .into_iter()
            .collect();
        assert!(fields.checked("on"));
        assert!(!fields.checked("off"));
        assert!(!fields.checked("zero"));
        assert!(!fields.checked("blank"));
        assert!(!fields.checked("missing"));
    }

    #[test]
    fn extension_is_sanitised() {
        let mut file = UploadedFile {
            field: "avatar".into(),
            file_name: "Me.JPG".into(),
            content_type: "image/jpeg".into(),
            data: vec![1],
        };
        assert_eq!(file.extension().as_deref(), Some("jpg"));

        file.file_name = "../../etc/passwd".into();
        assert_eq!(file.extension(), None);

        file.file_name = "noext".into();
        assert_eq!(file.extension(), None);
    }
}
