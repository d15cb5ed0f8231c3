//! The JSON document returned to DoH clients.
//!
//! Field names follow the de-facto JSON DoH layout: the top-level status and
//! flag fields are capitalized, the question/answer members are lowercase
//! except `TTL`.

use serde::{Deserialize, Serialize};

use crate::dns_record::ResolvedRecords;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DohResponse {
    #[serde(rename = "Status")]
    pub status: u32,
    #[serde(rename = "TC")]
    pub truncated: bool,
    #[serde(rename = "RD")]
    pub recursion_desired: bool,
    #[serde(rename = "RA")]
    pub recursion_available: bool,
    #[serde(rename = "AD")]
    pub authenticated_data: bool,
    #[serde(rename = "CD")]
    pub checking_disabled: bool,
    #[serde(rename = "Question")]
    pub question: Vec<Question>,
    #[serde(rename = "Answer")]
    pub answer: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: u16,
    #[serde(rename = "TTL")]
    pub ttl: u32,
    pub data: String,
}

impl DohResponse {
    /// Builds the document for `name` from normalized records. Every answer
    /// carries the question's name and type code and the configured `ttl`.
    ///
    /// The resolver flags are fixed: no truncation or DNSSEC state is tracked.
    pub fn from_records(name: &str, records: &ResolvedRecords, ttl: u32) -> Self {
        let record_type = records.record_type.to_u16();

        let answer = records
            .data
            .iter()
            .map(|data| Answer {
                name: name.to_string(),
                record_type,
                ttl,
                data: data.clone(),
            })
            .collect();

        Self {
            status: 0,
            truncated: false,
            recursion_desired: true,
            recursion_available: true,
            authenticated_data: false,
            checking_disabled: false,
            question: vec![Question {
                name: name.to_string(),
                record_type,
            }],
            answer,
        }
    }

    pub fn answer_data(&self) -> Vec<&str> {
        self.answer.iter().map(|a| a.data.as_str()).collect()
    }
}
