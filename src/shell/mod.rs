//! Interactive dashboard loop.
//!
//! Each line of input is either a command (`:tab`, `:search`, ...) or a
//! ticker. Ticker searches run as spawned tasks so the prompt keeps accepting
//! input while a request is in flight; every completed search re-renders the
//! whole dashboard.

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::client::AnalysisApi;
use crate::criteria::CriterionKey;
use crate::dashboard::{AnalysisClient, SearchOutcome};
use crate::render::{render, RenderOptions, Tab};

const HELP: &str = "\
Comandos:
  <TICKER>            analisa um ativo (ex: PETR4, HGLG11)
  :tab <aba>          troca de aba (criteria, fundamentals, news)
  :search <termo>     sugere ativos (atalho: ?<termo>)
  :health             estado do backend
  :criteria           lista os critérios do Método Society
  :help               mostra esta ajuda
  :quit               sai (também :q ou exit)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Analyze(String),
    SwitchTab(Tab),
    Suggest(String),
    Health,
    Criteria,
    Help,
    Quit,
    Blank,
    Invalid(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ShellCommand::Blank;
        }
        if line == "exit" {
            return ShellCommand::Quit;
        }
        if let Some(query) = line.strip_prefix('?') {
            return suggest_or_invalid(query);
        }

        let Some(command) = line.strip_prefix(':') else {
            return ShellCommand::Analyze(line.to_string());
        };

        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map(|(n, a)| (n, a.trim()))
            .unwrap_or((command, ""));

        match name {
            "q" | "quit" => ShellCommand::Quit,
            "help" | "h" => ShellCommand::Help,
            "health" => ShellCommand::Health,
            "criteria" => ShellCommand::Criteria,
            "search" | "s" => suggest_or_invalid(arg),
            "tab" | "t" => match arg.parse::<Tab>() {
                Ok(tab) => ShellCommand::SwitchTab(tab),
                Err(e) => ShellCommand::Invalid(e.to_string()),
            },
            other => ShellCommand::Invalid(format!("unknown command :{}", other)),
        }
    }
}

fn suggest_or_invalid(query: &str) -> ShellCommand {
    let query = query.trim();
    if query.is_empty() {
        ShellCommand::Invalid("search needs a term".to_string())
    } else {
        ShellCommand::Suggest(query.to_string())
    }
}

pub fn criteria_listing() -> String {
    CriterionKey::ALL
        .iter()
        .map(|k| format!("  {:<22}{}", k.as_str(), k.title()))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Loop ──────────────────────────────────────────────────────────────────────

pub struct Shell<A, W> {
    client: Arc<AnalysisClient<A>>,
    options: RenderOptions,
    out: W,
}

impl<A: AnalysisApi + 'static, W: Write> Shell<A, W> {
    pub fn new(client: Arc<AnalysisClient<A>>, options: RenderOptions, out: W) -> Self {
        Self {
            client,
            options,
            out,
        }
    }

    /// Reads commands from `input` until EOF or `:quit`, then waits for every
    /// search still in flight. Hands the output sink back when done.
    pub async fn run<R: AsyncBufRead + Unpin>(mut self, input: R) -> Result<W> {
        let mut lines = input.lines();
        let mut searches: JoinSet<SearchOutcome> = JoinSet::new();

        self.redraw().await?;
        writeln!(self.out, "{}", HELP)?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if !self.handle(ShellCommand::parse(&line), &mut searches).await? {
                        break;
                    }
                }
                Some(joined) = searches.join_next(), if !searches.is_empty() => {
                    self.search_finished(joined).await?;
                }
            }
        }

        if !searches.is_empty() {
            info!("Waiting for {} in-flight search(es)", searches.len());
            while let Some(joined) = searches.join_next().await {
                self.search_finished(joined).await?;
            }
        }
        Ok(self.out)
    }

    /// Returns `false` when the shell should exit.
    async fn handle(
        &mut self,
        command: ShellCommand,
        searches: &mut JoinSet<SearchOutcome>,
    ) -> Result<bool> {
        match command {
            ShellCommand::Quit => return Ok(false),
            ShellCommand::Blank => {}
            ShellCommand::Help => writeln!(self.out, "{}", HELP)?,
            ShellCommand::Criteria => writeln!(self.out, "{}", criteria_listing())?,
            ShellCommand::Invalid(msg) => writeln!(self.out, "  {}", msg)?,
            ShellCommand::SwitchTab(tab) => {
                self.options.tab = tab;
                self.redraw().await?;
            }
            ShellCommand::Analyze(ticker) => {
                writeln!(self.out, "  Analisando {}...", ticker.to_uppercase())?;
                let client = Arc::clone(&self.client);
                searches.spawn(async move { client.search(&ticker).await });
            }
            ShellCommand::Suggest(query) => match self.client.api().suggest(&query).await {
                Ok(hits) if hits.is_empty() => {
                    writeln!(self.out, "  Nenhum ativo encontrado para {:?}", query)?
                }
                Ok(hits) => {
                    for hit in hits {
                        writeln!(self.out, "  {:<8} {}", hit.symbol, hit.name)?;
                    }
                }
                Err(e) => warn!("Search for {:?} failed: {}", query, e),
            },
            ShellCommand::Health => match self.client.api().health().await {
                Ok(health) => writeln!(self.out, "  {} ({})", health.status, health.message)?,
                Err(e) => warn!("Health check failed: {}", e),
            },
        }
        Ok(true)
    }

    async fn search_finished(&mut self, joined: Result<SearchOutcome, JoinError>) -> Result<()> {
        // Failures were already logged; the redraw shows whatever state
        // survived them.
        if let Err(e) = joined {
            error!("Search task panicked: {}", e);
        }
        self.redraw().await
    }

    async fn redraw(&mut self) -> Result<()> {
        let state = self.client.snapshot().await;
        writeln!(self.out, "{}", render(&state, &self.options))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiError;
    use crate::models::{AnalysisRequest, AnalysisResult, AssetHit, HealthStatus};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    /// Answers every analysis after a short delay, so searches are still in
    /// flight when the input runs out.
    struct SlowApi {
        delay: Duration,
    }

    #[async_trait]
    impl AnalysisApi for SlowApi {
        async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ApiError> {
            tokio::time::sleep(self.delay).await;
            if request.ticker == "XXXX3" {
                return Err(ApiError::Status {
                    status: 404,
                    message: Some("Ativo não encontrado".into()),
                });
            }
            Ok(serde_json::from_value(json!({
                "score": 88.89,
                "recommendation": "COMPRA - Excelente ativo segundo o Método Society",
                "criteria_results": {
                    "bom_roe": {"passed": true, "value": "25.00%", "description": "ROE de 25.00% (mínimo: 15%)"}
                },
                "basic_data": {
                    "symbol": request.ticker,
                    "longName": "Petróleo Brasileiro S.A.",
                    "currency": "BRL",
                    "regularMarketPrice": 38.5,
                    "marketCap": 5.0e11
                }
            }))
            .unwrap())
        }

        async fn suggest(&self, query: &str) -> Result<Vec<AssetHit>, ApiError> {
            if query.eq_ignore_ascii_case("hglg") {
                Ok(vec![AssetHit {
                    symbol: "HGLG11".into(),
                    name: "CSHG Logística FII".into(),
                }])
            } else {
                Ok(vec![])
            }
        }

        async fn health(&self) -> Result<HealthStatus, ApiError> {
            Ok(HealthStatus::default())
        }
    }

    async fn run_shell(input: &str) -> String {
        let client = Arc::new(AnalysisClient::new(SlowApi {
            delay: Duration::from_millis(50),
        }));
        let out = Shell::new(client, RenderOptions::default(), Vec::new())
            .run(input.as_bytes())
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_search_in_flight_at_eof_is_rendered() {
        let out = run_shell("PETR4\n").await;
        assert!(out.contains("Analisando PETR4..."));
        assert!(out.contains("Score Society: 89% (high)"));
    }

    #[tokio::test]
    async fn test_search_in_flight_at_quit_is_rendered() {
        let out = run_shell("vale3\n:q\nITUB4\n").await;
        assert!(out.contains("Score Society"));
        assert!(!out.contains("Analisando ITUB4"));
    }

    #[tokio::test]
    async fn test_tab_switch_redraws() {
        let out = run_shell("PETR4\n:tab news\n").await;
        assert!(out.contains("[Notícias]"));
        assert!(out.contains("notícias em desenvolvimento"));
    }

    #[tokio::test]
    async fn test_failed_search_still_redraws() {
        let out = run_shell("XXXX3\n").await;
        // welcome once at startup and once after the failed search
        assert_eq!(out.matches("Bem-vindo ao Society Analyzer").count(), 2);
        assert!(!out.contains("Score Society"));
    }

    #[tokio::test]
    async fn test_suggest_and_invalid_commands() {
        let out = run_shell("?hglg\n:search nada\n:frobnicate\n").await;
        assert!(out.contains("HGLG11   CSHG Logística FII"));
        assert!(out.contains("Nenhum ativo encontrado para \"nada\""));
        assert!(out.contains("unknown command :frobnicate"));
    }

    #[test]
    fn test_parse_ticker() {
        assert_eq!(ShellCommand::parse("petr4"), ShellCommand::Analyze("petr4".into()));
        assert_eq!(ShellCommand::parse("  HGLG11 \n"), ShellCommand::Analyze("HGLG11".into()));
    }

    #[test]
    fn test_parse_blank() {
        assert_eq!(ShellCommand::parse(""), ShellCommand::Blank);
        assert_eq!(ShellCommand::parse("   \t"), ShellCommand::Blank);
    }

    #[test]
    fn test_parse_quit() {
        for line in [":q", ":quit", "exit", "  :q  "] {
            assert_eq!(ShellCommand::parse(line), ShellCommand::Quit, "{line}");
        }
    }

    #[test]
    fn test_parse_tab() {
        assert_eq!(ShellCommand::parse(":tab news"), ShellCommand::SwitchTab(Tab::News));
        assert_eq!(ShellCommand::parse(":t fund"), ShellCommand::SwitchTab(Tab::Fundamentals));
        assert!(matches!(ShellCommand::parse(":tab"), ShellCommand::Invalid(_)));
        assert!(matches!(ShellCommand::parse(":tab charts"), ShellCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_search() {
        assert_eq!(ShellCommand::parse(":search fii"), ShellCommand::Suggest("fii".into()));
        assert_eq!(ShellCommand::parse("?  vale"), ShellCommand::Suggest("vale".into()));
        assert_eq!(
            ShellCommand::parse(":s banco bradesco"),
            ShellCommand::Suggest("banco bradesco".into())
        );
        assert!(matches!(ShellCommand::parse("?"), ShellCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(ShellCommand::parse(":health"), ShellCommand::Health);
        assert_eq!(ShellCommand::parse(":help"), ShellCommand::Help);
        assert_eq!(ShellCommand::parse(":criteria"), ShellCommand::Criteria);
        assert!(matches!(ShellCommand::parse(":frobnicate"), ShellCommand::Invalid(_)));
    }

    #[test]
    fn test_criteria_listing() {
        let listing = criteria_listing();
        assert_eq!(listing.lines().count(), 9);
        assert!(listing.contains("bom_roe"));
        assert!(listing.contains("Payout Aceitável"));
    }
}
