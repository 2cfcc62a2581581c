use serde::{Deserialize, Serialize};

use crate::dto::sumula::{SumulaDto, SumulaListingDto};

/// Response of `GET /api/sumula/ativas/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveSumulasResponse {
    /// Qualifying súmulas.
    #[serde(default)]
    pub sumulas_classificatoria: Vec<SumulaListingDto>,
    /// Immortal súmulas.
    #[serde(default)]
    pub sumulas_imortal: Vec<SumulaListingDto>,
}

impl ActiveSumulasResponse {
    /// Merge both lists, qualifying súmulas first, tagging each with its kind.
    pub fn into_sumulas(self) -> Vec<SumulaDto> {
        let qualifying = self
            .sumulas_classificatoria
            .into_iter()
            .map(|listing| SumulaDto::from_listing(listing, false));
        let immortal = self
            .sumulas_imortal
            .into_iter()
            .map(|listing| SumulaDto::from_listing(listing, true));
        qualifying.chain(immortal).collect()
    }
}

/// Body of `PUT /api/sumula/add-referee/`, claiming a súmula for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRefereeRequest {
    /// Súmula being claimed.
    pub sumula_id: i64,
    /// Whether it came from the immortal list.
    pub is_imortal: bool,
}

impl From<&SumulaDto> for AddRefereeRequest {
    fn from(value: &SumulaDto) -> Self {
        Self {
            sumula_id: value.id,
            is_imortal: value.is_imortal,
        }
    }
}
