//! Multipart form payloads
//!
//! `reqwest::multipart::Form` is consumed on send, so steps describe the
//! form with [`FormData`] and the client converts it per request.

use reqwest::multipart::{Form, Part};

use crate::common::Result;

/// A binary attachment inside a multipart form
#[derive(Debug, Clone)]
pub struct FilePart {
    pub name: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Text fields plus file attachments
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Append a file attachment
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.files.push(FilePart {
            name: name.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        });
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    /// Build the reqwest form
    pub fn to_multipart(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        for file in &self.files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime)?;
            form = form.part(file.name.clone(), part);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_keeps_declaration_order() {
        let form = FormData::new()
            .text("template_name", "Test Template")
            .text("sms_text", "Test SMS Text")
            .file("logo", "logo.png", "image/png", vec![1, 2, 3]);

        let names: Vec<&str> = form.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["template_name", "sms_text"]);
        assert_eq!(form.files().len(), 1);
        assert_eq!(form.files()[0].file_name, "logo.png");
        assert!(form.to_multipart().is_ok());
    }

    #[test]
    fn test_invalid_mime_is_rejected() {
        let form = FormData::new().file("video", "v.mp4", "not a mime", vec![0]);
        assert!(form.to_multipart().is_err());
    }
}
