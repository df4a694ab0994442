//! The nine Método Society criteria as reported by the analysis backend.
//!
//! The backend keys its `criteria_results` map with snake_case Portuguese
//! identifiers. This module knows their display titles and canonical order;
//! anything else the backend sends is shown under its raw key.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CriterionKey {
    SetorPerene,
    FluxoCaixa,
    LucrosConsistentes,
    ReceitaCrescente,
    PayoutAceitavel,
    PoucaDivida,
    BonsDividendos,
    BomRoe,
    BomRoic,
}

impl CriterionKey {
    pub const ALL: [CriterionKey; 9] = [
        CriterionKey::SetorPerene,
        CriterionKey::FluxoCaixa,
        CriterionKey::LucrosConsistentes,
        CriterionKey::ReceitaCrescente,
        CriterionKey::PayoutAceitavel,
        CriterionKey::PoucaDivida,
        CriterionKey::BonsDividendos,
        CriterionKey::BomRoe,
        CriterionKey::BomRoic,
    ];

    /// Wire key used in `criteria_results`.
    pub fn as_str(self) -> &'static str {
        match self {
            CriterionKey::SetorPerene => "setor_perene",
            CriterionKey::FluxoCaixa => "fluxo_caixa",
            CriterionKey::LucrosConsistentes => "lucros_consistentes",
            CriterionKey::ReceitaCrescente => "receita_crescente",
            CriterionKey::PayoutAceitavel => "payout_aceitavel",
            CriterionKey::PoucaDivida => "pouca_divida",
            CriterionKey::BonsDividendos => "bons_dividendos",
            CriterionKey::BomRoe => "bom_roe",
            CriterionKey::BomRoic => "bom_roic",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            CriterionKey::SetorPerene => "Setor Perene",
            CriterionKey::FluxoCaixa => "Fluxo de Caixa",
            CriterionKey::LucrosConsistentes => "Lucros Consistentes",
            CriterionKey::ReceitaCrescente => "Receita Crescente",
            CriterionKey::PayoutAceitavel => "Payout Aceitável",
            CriterionKey::PoucaDivida => "Pouca Dívida",
            CriterionKey::BonsDividendos => "Bons Dividendos",
            CriterionKey::BomRoe => "Bom ROE",
            CriterionKey::BomRoic => "Bom ROIC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown criterion: {0}")]
pub struct UnknownCriterion(pub String);

impl FromStr for CriterionKey {
    type Err = UnknownCriterion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CriterionKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownCriterion(s.to_string()))
    }
}

impl fmt::Display for CriterionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display title for a backend criterion key. Unknown keys come back as-is.
pub fn label(key: &str) -> &str {
    match key.parse::<CriterionKey>() {
        Ok(k) => k.title(),
        Err(_) => key,
    }
}
