//! Request/response DTOs for scan ingestion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use services::scan::{ExamSubjectRef, ScanClaim, ScanScope};

/// How the operator's scanning view was configured. All three variants are
/// thin filters over the same validator.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanModeReq {
    /// One active (exam, subject) context.
    Single { exam_id: i64, subject_id: i64 },
    /// Operator-selected combinations; each scan matches independently.
    Bulk { combinations: Vec<ExamSubjectRef> },
    /// Combinations derived from all exams scheduled on the date.
    Date { date: NaiveDate },
}

impl From<ScanModeReq> for ScanScope {
    fn from(req: ScanModeReq) -> Self {
        match req {
            ScanModeReq::Single {
                exam_id,
                subject_id,
            } => ScanScope::Single(ExamSubjectRef {
                exam_id,
                subject_id,
            }),
            ScanModeReq::Bulk { combinations } => ScanScope::Bulk(combinations),
            ScanModeReq::Date { date } => ScanScope::Date(date),
        }
    }
}

/// A decoded QR payload, exactly as the scanner read it.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClaimReq {
    Exam {
        exam_id: i64,
        subject_id: i64,
        student_id: i64,
        secret: String,
    },
    Lecture {
        lecture_id: i64,
        student_id: i64,
        secret: String,
    },
}

impl From<ClaimReq> for ScanClaim {
    fn from(req: ClaimReq) -> Self {
        match req {
            ClaimReq::Exam {
                exam_id,
                subject_id,
                student_id,
                secret,
            } => ScanClaim::Exam {
                exam_id,
                subject_id,
                student_id,
                secret,
            },
            ClaimReq::Lecture {
                lecture_id,
                student_id,
                secret,
            } => ScanClaim::Lecture {
                lecture_id,
                student_id,
                secret,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanReq {
    /// Required for exam scans; lecture self-scans carry no mode.
    pub mode: Option<ScanModeReq>,
    pub claim: ClaimReq,
    /// Personnel id of the operator performing the scan, for audit.
    pub marked_by: Option<i64>,
}

#[derive(Debug, Serialize, Default)]
pub struct ScanResponse {
    /// `present` or `already_marked`.
    pub status: String,
    pub student_name: Option<String>,
}
