use crate::utils::time::iso;
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agenda {
    pub agenda_id: String,
    pub agenda_title: String,
    pub pdf_base64: String,
    pub upload_timestamp: BsonDateTime,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgendaView {
    pub agenda_id: String,
    pub agenda_title: String,
    pub pdf_base64: String,
    pub upload_timestamp: String,
}

impl From<Agenda> for AgendaView {
    fn from(a: Agenda) -> Self {
        Self {
            agenda_id: a.agenda_id,
            agenda_title: a.agenda_title,
            pdf_base64: a.pdf_base64,
            upload_timestamp: iso(a.upload_timestamp),
        }
    }
}
