use serde::Serialize;
use utoipa::ToSchema;

/// Collection metadata. Listings are unpaginated, so only the count is reported.
#[derive(Debug, Serialize, ToSchema, Clone, Default)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

impl Meta {
    pub fn all(total: usize) -> Self {
        Self {
            total: Some(total as i64),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Envelope shared by success and error bodies: `{message, data, meta}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    pub fn failure(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta: Some(Meta::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_meta_reports_total_only() {
        let body = ApiResponse::success("Pizzas", vec![1, 2, 3], Some(Meta::all(3)));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["meta"], serde_json::json!({ "total": 3 }));
    }

    #[test]
    fn empty_meta_serializes_as_empty_object() {
        let body = ApiResponse::success("OK", "x", Some(Meta::empty()));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["meta"], serde_json::json!({}));
    }
}
