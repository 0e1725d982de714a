//! Form types and validation
//!
//! Typed request forms with field-level validation. Validation failures
//! never leave the page: handlers re-render the form template with the
//! returned error map and HTTP 200.

use axum::extract::Multipart;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::config::UploadConfig;
use crate::web::error::PageError;

/// Field name -> message map rendered back into the form template
pub type FieldErrors = BTreeMap<&'static str, String>;

const REQUIRED: &str = "This field is required.";

fn length_message(min: usize, max: usize) -> String {
    format!("Field must be between {} and {} characters long.", min, max)
}

fn check_length(errors: &mut FieldErrors, field: &'static str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.insert(field, length_message(min, max));
    }
}

/// Signup form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm: String,
}

impl SignupForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_length(&mut errors, "name", &self.name, 4, 25);
        check_length(&mut errors, "email", &self.email, 6, 35);
        if !errors.contains_key("email") && !self.email.contains('@') {
            errors.insert("email", "Invalid email address.".to_string());
        }

        if self.password.is_empty() {
            errors.insert("password", REQUIRED.to_string());
        } else if self.password != self.confirm {
            errors.insert("password", "Passwords must match".to_string());
        }

        errors
    }
}

/// Login form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        check_length(&mut errors, "email", &self.email, 6, 35);
        if self.password.is_empty() {
            errors.insert("password", REQUIRED.to_string());
        }

        errors
    }
}

/// Category form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
}

impl CategoryForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.name.trim().is_empty() {
            errors.insert("name", REQUIRED.to_string());
        } else if self.name.chars().count() > 50 {
            errors.insert("name", length_message(1, 50));
        }

        errors
    }
}

/// An uploaded image, held in memory until the form validates
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Item form (multipart: text fields plus an optional image upload)
#[derive(Debug, Clone, Default)]
pub struct ItemForm {
    pub name: String,
    pub body: String,
    pub category_id: Option<i64>,
    pub image: Option<ImageUpload>,
}

impl ItemForm {
    /// Read the multipart body into a form.
    ///
    /// Unknown fields are skipped; an empty file part counts as no upload.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, PageError> {
        let mut form = ItemForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| PageError::Internal(anyhow::anyhow!("Failed to read form: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "name" => {
                    form.name = field
                        .text()
                        .await
                        .map_err(|e| PageError::Internal(anyhow::anyhow!(e)))?;
                }
                "body" => {
                    form.body = field
                        .text()
                        .await
                        .map_err(|e| PageError::Internal(anyhow::anyhow!(e)))?;
                }
                "category_id" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| PageError::Internal(anyhow::anyhow!(e)))?;
                    form.category_id = text.trim().parse().ok();
                }
                "image" => {
                    let content_type = field
                        .content_type()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "application/octet-stream".to_string());
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| PageError::Internal(anyhow::anyhow!(e)))?;
                    if !data.is_empty() {
                        form.image = Some(ImageUpload {
                            data: data.to_vec(),
                            content_type,
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    pub fn validate(&self, upload: &UploadConfig) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.name.trim().is_empty() {
            errors.insert("name", REQUIRED.to_string());
        } else if self.name.chars().count() > 80 {
            errors.insert("name", length_message(1, 80));
        }

        if self.category_id.is_none() {
            errors.insert("category_id", REQUIRED.to_string());
        }

        if let Some(ref image) = self.image {
            if !upload.is_type_allowed(&image.content_type) {
                errors.insert(
                    "image",
                    format!("File type {} is not allowed.", image.content_type),
                );
            } else if image.data.len() as u64 > upload.max_file_size {
                errors.insert(
                    "image",
                    format!(
                        "File too large. Maximum size: {} MB",
                        upload.max_file_size / 1024 / 1024
                    ),
                );
            }
        }

        errors
    }
}
