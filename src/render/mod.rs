//! Text rendering of the dashboard. Everything here is a pure function of
//! the dashboard state and the render options.

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::str::FromStr;

use crate::config::DisplayConfig;
use crate::criteria::{self, CriterionKey};
use crate::dashboard::{DashboardState, Screen};
use crate::format::{format_change, format_market_cap_with, format_price};
use crate::models::{AnalysisResult, AssetSnapshot};

/// Widest progress bar a config file can ask for.
const MAX_PROGRESS_WIDTH: usize = 200;

const RULE: &str = "─────────────────────────────────────────────────────────────";

// ── Tabs ──────────────────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Criteria,
    Fundamentals,
    News,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Criteria, Tab::Fundamentals, Tab::News];

    pub fn name(self) -> &'static str {
        match self {
            Tab::Criteria => "criteria",
            Tab::Fundamentals => "fundamentals",
            Tab::News => "news",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Criteria => "Critérios",
            Tab::Fundamentals => "Fundamentos",
            Tab::News => "Notícias",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnknownTab {
    #[error("empty tab name")]
    Empty,
    #[error("unknown tab: {0}")]
    Name(String),
}

impl FromStr for Tab {
    type Err = UnknownTab;

    /// Accepts the English names, the Portuguese titles, or a unique prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        if needle.is_empty() {
            return Err(UnknownTab::Empty);
        }
        Tab::ALL
            .into_iter()
            .find(|t| t.name().starts_with(&needle) || t.title().to_lowercase().starts_with(&needle))
            .ok_or_else(|| UnknownTab::Name(s.trim().to_string()))
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

// ── Score tier ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    High,
    Good,
    Fair,
    Low,
}

impl ScoreTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => ScoreTier::High,
            60..=79 => ScoreTier::Good,
            40..=59 => ScoreTier::Fair,
            _ => ScoreTier::Low,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScoreTier::High => "high",
            ScoreTier::Good => "good",
            ScoreTier::Fair => "fair",
            ScoreTier::Low => "low",
        }
    }

    /// Badge style used for the recommendation.
    pub fn badge_variant(self) -> &'static str {
        match self {
            ScoreTier::High => "default",
            ScoreTier::Good => "secondary",
            ScoreTier::Fair => "outline",
            ScoreTier::Low => "destructive",
        }
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub tab: Tab,
    pub currency_prefix: String,
    pub progress_width: usize,
}

impl From<&DisplayConfig> for RenderOptions {
    fn from(cfg: &DisplayConfig) -> Self {
        Self {
            tab: cfg.default_tab,
            currency_prefix: cfg.currency_prefix.clone(),
            progress_width: cfg.progress_width.clamp(1, MAX_PROGRESS_WIDTH),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

pub fn render(state: &DashboardState, opts: &RenderOptions) -> String {
    let mut out = String::new();
    render_header(&mut out);
    render_search_bar(&mut out, state);

    // A result stays on screen while the next search is loading.
    match state.result() {
        Some(result) => {
            let asset = state.selected_asset().unwrap_or(&result.basic_data);
            render_result(&mut out, result, asset, opts);
        }
        None => render_welcome(&mut out),
    }
    out
}

fn render_header(out: &mut String) {
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "  Society Analyzer                          [Método Society]");
    let _ = writeln!(out, "  Análise Inteligente de Investimentos");
    let _ = writeln!(out, "{}", RULE);
}

fn render_search_bar(out: &mut String, state: &DashboardState) {
    let query = if state.query().trim().is_empty() {
        "Digite o ticker do ativo..."
    } else {
        state.query()
    };
    let button = if state.screen() == Screen::Loading {
        "Analisando..."
    } else {
        "Analisar"
    };
    let _ = writeln!(out, "  Buscar Ativo: {}  [{}]", query, button);
    let _ = writeln!(out);
}

fn render_welcome(out: &mut String) {
    let _ = writeln!(out, "  Bem-vindo ao Society Analyzer");
    let _ = writeln!(out);
    let _ = writeln!(out, "  Analise ações e fundos imobiliários usando o Método Society.");
    let _ = writeln!(out, "  Digite um ticker acima para começar sua análise (ex: PETR4, HGLG11).");
    let _ = writeln!(out);
    let _ = writeln!(out, "  • Análise Completa: 9 critérios fundamentais");
    let _ = writeln!(out, "  • Score de Segurança: Baseado no Método Society");
}

fn render_result(out: &mut String, result: &AnalysisResult, asset: &AssetSnapshot, opts: &RenderOptions) {
    if result.demo_mode {
        let message = result
            .demo_message
            .as_deref()
            .unwrap_or("Dados de demonstração");
        let _ = writeln!(out, "  ! {}", message);
        let _ = writeln!(out);
    }

    // Asset overview
    let _ = writeln!(out, "  {}", asset.symbol);
    if !asset.long_name.is_empty() {
        let _ = writeln!(out, "  {}", asset.long_name);
    }
    let _ = writeln!(
        out,
        "  {} {}   {}",
        asset.currency,
        format_price(asset.regular_market_price),
        format_change(asset.regular_market_change, asset.regular_market_change_percent)
    );
    if let Some(at) = result.analysed_at() {
        let _ = writeln!(out, "  Análise de {}", at.format("%d/%m/%Y %H:%M"));
    }
    let _ = writeln!(out);

    // Score card
    let tier = ScoreTier::from_score(result.score);
    let _ = writeln!(out, "  Score Society: {}% ({})", result.score, tier.name());
    let _ = writeln!(out, "  [{}] {}", tier.badge_variant(), result.recommendation);
    let _ = writeln!(out, "  {}", progress_bar(result.score, opts.progress_width));
    let _ = writeln!(out);

    // Tabs
    let _ = writeln!(out, "  {}", tab_strip(opts.tab));
    let body = match opts.tab {
        Tab::Criteria => criteria_table(result),
        Tab::Fundamentals => fundamentals_table(result, asset, &opts.currency_prefix),
        Tab::News => news_placeholder(),
    };
    let _ = writeln!(out, "{}", body);
}

// ── Pieces ────────────────────────────────────────────────────────────────────

/// Filled/empty bar proportional to a 0–100 score.
pub fn progress_bar(score: u8, width: usize) -> String {
    let score = usize::from(score.min(100));
    let filled = (score * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn tab_strip(active: Tab) -> String {
    Tab::ALL
        .iter()
        .map(|t| {
            if *t == active {
                format!("[{}]", t.title())
            } else {
                format!(" {} ", t.title())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn criteria_table(result: &AnalysisResult) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Critério", "Status", "Valor", "Descrição"]);

    for (key, outcome) in result.ordered_criteria() {
        table.add_row(vec![
            criteria::label(key).to_string(),
            if outcome.passed { "Aprovado" } else { "Reprovado" }.to_string(),
            outcome.display_value().unwrap_or("").to_string(),
            outcome.description.clone(),
        ]);
    }
    table.to_string()
}

/// Market cap cell: absent or zero values show as "N/A".
pub fn market_cap_cell(value: Option<f64>, prefix: &str) -> String {
    match value {
        Some(v) if v != 0.0 && !v.is_nan() => format_market_cap_with(v, prefix),
        _ => "N/A".to_string(),
    }
}

fn criterion_value(result: &AnalysisResult, key: CriterionKey) -> String {
    result
        .criterion(key)
        .and_then(|c| c.display_value())
        .unwrap_or("N/A")
        .to_string()
}

fn fundamentals_table(result: &AnalysisResult, asset: &AssetSnapshot, prefix: &str) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Valor de Mercado", "Dividend Yield", "ROE", "Dívida/EBITDA"])
        .add_row(vec![
            market_cap_cell(asset.market_cap, prefix),
            criterion_value(result, CriterionKey::BonsDividendos),
            criterion_value(result, CriterionKey::BomRoe),
            criterion_value(result, CriterionKey::PoucaDivida),
        ]);
    table.to_string()
}

fn news_placeholder() -> String {
    [
        "  Funcionalidade de notícias em desenvolvimento",
        "  Em breve, você terá acesso às últimas notícias sobre o ativo",
    ]
    .join("\n")
}
