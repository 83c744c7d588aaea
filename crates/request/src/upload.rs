use bytes::Bytes;

/// A file part received in a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    field_name: String,
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

impl UploadedFile {
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: Bytes,
    ) -> Self {
        Self { field_name: field_name.into(), file_name: file_name.into(), content_type, data }
    }

    /// The form field the file was sent under.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The client supplied file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}
