use std::sync::Arc;

use anyhow::Result;
use colored::*;
use reqwest::Client;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use bounty_clients::{ApiClient, DeckbuilderEnv, FileStore, VerificationStatus};
use bounty_common::{get_current_timestamp_millis, setup_tracing, EnvVars};
use bounty_runtime::{
    load_left_panel_width, save_left_panel_width, text_matches, CardHistorySource, CatalogCache,
    DeckSession, FilterGroup, FilterValue, LocalStore, Notification, PriceTrend, SessionConfig,
};

mod tui;
mod view;

use tui::Tui;

const MAX_LISTED_CARDS: usize = 50;

const MENU: [&str; 14] = [
    "Browse cards",
    "Search",
    "Filters",
    "Show deck",
    "Remove card",
    "Rename deck",
    "Clear deck",
    "Save deck",
    "Load saved deck",
    "Price history",
    "Verify email",
    "Layout",
    "Refresh catalog",
    "Exit",
];

struct App {
    api: ApiClient,
    store: Arc<dyn LocalStore>,
    catalog: CatalogCache,
    session: DeckSession,
    notifications: mpsc::Receiver<Notification>,
    tui: Tui,
}

impl App {
    async fn new(env: &DeckbuilderEnv) -> Result<Self> {
        let store: Arc<dyn LocalStore> = Arc::new(FileStore::open(&env.storage_dir)?);
        let mut api = ApiClient::new(env.api_url.clone(), Client::new());
        if let Some(cookie) = &env.session_cookie {
            api = api.with_session_cookie(cookie.clone());
        }

        let (mut session, notifications) = DeckSession::new(
            store.clone(),
            SessionConfig {
                snapshot_delay: env.snapshot_delay(),
            },
        );

        let tui = Tui::new()?;
        let pb = tui.create_spinner("Loading cards and restoring deck...");
        let (catalog, ()) = futures::join!(
            CatalogCache::load(store.clone(), &api, get_current_timestamp_millis()),
            session.restore(&api),
        );
        pb.finish_and_clear();
        info!("Catalog ready with {} cards", catalog.len());

        Ok(Self {
            api,
            store,
            catalog,
            session,
            notifications,
            tui,
        })
    }

    #[instrument(skip(self))]
    async fn run(&mut self) -> Result<()> {
        loop {
            self.drain_notifications();
            let selection = self.tui.select_item("What next?", &MENU).await?;
            let result = match MENU[selection] {
                "Browse cards" => self.browse().await,
                "Search" => self.search(),
                "Filters" => self.filters().await,
                "Show deck" => {
                    self.show_deck();
                    Ok(())
                }
                "Remove card" => self.remove_card().await,
                "Rename deck" => self.rename(),
                "Clear deck" => {
                    self.session.clear();
                    println!("{}", "Deck cleared.".yellow());
                    Ok(())
                }
                "Save deck" => self.save().await,
                "Load saved deck" => self.load_saved().await,
                "Price history" => self.price_history().await,
                "Verify email" => self.verify_email().await,
                "Layout" => self.layout(),
                "Refresh catalog" => self.refresh_catalog().await,
                _ => break,
            };
            if let Err(e) = result {
                error!("{:#}", e);
            }
        }

        self.session.flush()?;
        println!("{}", "Deck saved locally. Bye!".green());
        Ok(())
    }

    fn drain_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            self.tui.print_notification(&notification);
        }
    }

    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        match self.tui.get_user_input(&format!("{} ", label.cyan())) {
            Ok(line) => Ok(Some(line.trim().to_string())),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn browse(&mut self) -> Result<()> {
        let visible = self.session.visible_cards(&self.catalog);
        if visible.is_empty() {
            println!("{}", "No cards to show. Pick a color or type under Filters.".yellow());
            return Ok(());
        }

        println!("{} cards match", visible.len());
        let mut items: Vec<String> = visible
            .iter()
            .take(MAX_LISTED_CARDS)
            .map(|c| view::card_line(c))
            .collect();
        items.push("Back".to_string());

        let selection = self.tui.select_item("Add a card", &items).await?;
        let Some(card) = visible.get(selection).filter(|_| selection < MAX_LISTED_CARDS) else {
            return Ok(());
        };
        if self.session.add_card(card) {
            println!("{} {}", "Added".green(), card.name);
        } else {
            println!("{} {}", "Could not add".red(), card.name);
        }
        Ok(())
    }

    fn search(&mut self) -> Result<()> {
        if let Some(search) = self.prompt("Search (empty to clear):")? {
            self.session.set_search(search);
        }
        Ok(())
    }

    async fn filters(&mut self) -> Result<()> {
        let mut items: Vec<String> = FilterGroup::ALL.iter().map(|g| g.to_string()).collect();
        items.push("Clear all filters".to_string());
        items.push("Back".to_string());

        let selection = self.tui.select_item("Filter group", &items).await?;
        let Some(group) = FilterGroup::ALL.get(selection).copied() else {
            if items[selection] == "Clear all filters" {
                self.session.clear_filters();
            }
            return Ok(());
        };

        match group {
            FilterGroup::Power | FilterGroup::Price => {
                let label = format!("{} range as \"min max\" (empty to remove):", group);
                let Some(input) = self.prompt(&label)? else {
                    return Ok(());
                };
                if input.is_empty() {
                    self.session.remove_filter(group);
                } else if let Some((min, max)) = view::parse_range(&input) {
                    self.session.set_filter(group, FilterValue::range(min, max));
                } else {
                    println!("{}", "Expected two numbers, min first.".red());
                }
            }
            _ => {
                let options = view::filter_options(self.catalog.cards(), group);
                if options.is_empty() {
                    println!("{}", "No values in the catalog.".yellow());
                    return Ok(());
                }
                let labels: Vec<String> = options
                    .iter()
                    .map(|o| view::option_label(self.session.filters(), group, o))
                    .collect();
                let selection = self.tui.select_item("Toggle", &labels).await?;
                self.session.toggle_filter(group, &options[selection]);
            }
        }
        Ok(())
    }

    fn show_deck(&self) {
        let deck = self.session.deck();
        println!("{}", view::deck_summary(deck).bold());
        println!("{}", view::curve("Cost", deck.cost_map()));
        println!("{}", view::curve("Rarity", deck.rarity_map()));
        println!("{}", view::curve("Counter", deck.counter_map()));
    }

    async fn remove_card(&mut self) -> Result<()> {
        let groups: Vec<_> = view::grouped(self.session.deck().cards())
            .into_iter()
            .map(|(card, copies)| (card.clone(), copies))
            .collect();
        if groups.is_empty() {
            println!("{}", "Deck is empty.".yellow());
            return Ok(());
        }

        let mut items: Vec<String> = groups
            .iter()
            .map(|(card, copies)| format!("{}x {}", copies, view::card_line(card)))
            .collect();
        items.push("Back".to_string());

        let selection = self.tui.select_item("Remove one copy", &items).await?;
        if let Some((card, _)) = groups.get(selection) {
            self.session.remove_card(card);
        }
        Ok(())
    }

    fn rename(&mut self) -> Result<()> {
        if let Some(name) = self.prompt("Deck name:")?.filter(|n| !n.is_empty()) {
            self.session.rename(name);
        }
        Ok(())
    }

    async fn save(&mut self) -> Result<()> {
        let pb = self.tui.create_spinner("Saving deck...");
        let result = self.session.save(&self.api).await;
        pb.finish_and_clear();
        if let Err(e) = result {
            debug!("save reported: {:#}", e);
        }
        Ok(())
    }

    async fn load_saved(&mut self) -> Result<()> {
        let pb = self.tui.create_spinner("Fetching decks...");
        let decks = self.session.list_remote(&self.api).await;
        pb.finish_and_clear();
        let Ok(decks) = decks else {
            return Ok(());
        };
        if decks.is_empty() {
            println!("No saved decks.");
            return Ok(());
        }

        let mut items: Vec<String> = decks
            .iter()
            .map(|d| format!("{} ({} cards)", d.name, d.cards.len()))
            .collect();
        items.push("Back".to_string());

        let selection = self.tui.select_item("Load deck", &items).await?;
        if let Some(remote) = decks.get(selection) {
            self.session.load_remote(remote, &self.catalog, &self.api).await;
            println!("{} {}", "Loaded".green(), self.session.deck().name());
        }
        Ok(())
    }

    async fn price_history(&mut self) -> Result<()> {
        let Some(search) = self.prompt("Card name or id:")?.filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        let matches: Vec<_> = self
            .catalog
            .cards()
            .iter()
            .filter(|c| text_matches(c, &search))
            .take(MAX_LISTED_CARDS)
            .cloned()
            .collect();
        if matches.is_empty() {
            println!("{}", "No matching cards.".yellow());
            return Ok(());
        }

        let items: Vec<String> = matches.iter().map(view::card_line).collect();
        let card = &matches[self.tui.select_item("Card", &items).await?];

        let pb = self.tui.create_spinner("Fetching price history...");
        let history = self.api.card_history(card.id).await;
        pb.finish_and_clear();
        let history = history?;

        for point in &history {
            match point.market_price {
                Some(price) => println!("  {}  ${:.2}", point.history_date, price),
                None => println!("  {}  -", point.history_date),
            }
        }
        match PriceTrend::from_history(&history) {
            Some(trend) => {
                let change = trend.change();
                let change = if change < 0.0 {
                    format!("{:.2}", change).red()
                } else {
                    format!("+{:.2}", change).green()
                };
                println!(
                    "low ${:.2} high ${:.2} change {}",
                    trend.low, trend.high, change
                );
            }
            None => println!("No price history for {}", card.name),
        }
        Ok(())
    }

    async fn verify_email(&mut self) -> Result<()> {
        let token = self.prompt("Verification token:")?;
        let status = self.api.verify_email(token.as_deref()).await;
        match status {
            VerificationStatus::Verified => println!("{}", status.message().green()),
            VerificationStatus::Failed(_) => println!("{}", status.message().red()),
        }
        Ok(())
    }

    fn layout(&mut self) -> Result<()> {
        let current = load_left_panel_width(self.store.as_ref());
        let label = format!("Left panel width (now {:.0}%):", current);
        let Some(input) = self.prompt(&label)?.filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        match input.parse::<f64>() {
            Ok(width) => {
                let stored = save_left_panel_width(self.store.as_ref(), width)?;
                println!("Left panel width set to {:.0}%", stored);
            }
            Err(_) => println!("{}", "Expected a number.".red()),
        }
        Ok(())
    }

    async fn refresh_catalog(&mut self) -> Result<()> {
        let pb = self.tui.create_spinner("Fetching cards...");
        let result = self
            .catalog
            .refresh(&self.api, get_current_timestamp_millis())
            .await;
        pb.finish_and_clear();
        result?;
        println!("{} {} cards", "Catalog refreshed:".green(), self.catalog.len());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let env = DeckbuilderEnv::load();
    info!("Using backend at {}", env.api_url.cyan());
    println!("{}", "Deckbuilder sandbox initializing ...".red());

    let mut app = App::new(&env).await?;
    println!("{}", "Sandbox ready. Pick Exit or press Esc to quit.".green());
    app.run().await
}
