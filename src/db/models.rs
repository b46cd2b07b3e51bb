use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    Active,
    Closed,
}

impl PollStatus {
    pub fn from_db(value: &str) -> Self {
        match value {
            "closed" => PollStatus::Closed,
            _ => PollStatus::Active,
        }
    }
}

/// A poll is effectively active only when `status` is `Active` AND the
/// deadline lies in the future; the two fields are independent and closing
/// is derived at query time, never written back automatically.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: Uuid,
    pub title: String,
    pub deadline: DateTime<Utc>,
    pub status: PollStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PollOption>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_text: String,
    pub display_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub poll: Poll,
    pub options: Vec<PollOption>,
    pub total_votes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_serializes_with_camel_case_keys() {
        let poll = Poll {
            id: Uuid::new_v4(),
            title: "Lunch".to_string(),
            deadline: Utc::now(),
            status: PollStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            options: None,
        };

        let value = serde_json::to_value(&poll).unwrap();
        assert_eq!(value["status"], "active");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("options").is_none());
    }

    #[test]
    fn option_omits_unset_count_and_percentage() {
        let option = PollOption {
            id: Uuid::new_v4(),
            poll_id: Uuid::new_v4(),
            option_text: "Pizza".to_string(),
            display_order: 1,
            vote_count: None,
            percentage: None,
        };

        let value = serde_json::to_value(&option).unwrap();
        assert_eq!(value["optionText"], "Pizza");
        assert_eq!(value["displayOrder"], 1);
        assert!(value.get("voteCount").is_none());
        assert!(value.get("percentage").is_none());
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        assert_eq!(PollStatus::from_db("active"), PollStatus::Active);
        assert_eq!(PollStatus::from_db("closed"), PollStatus::Closed);
    }
}
