use std::{io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use switch_gallery_core::{AppConfig, Gallery, GameCard, GameDetail};
use tokio::{
    spawn,
    sync::{mpsc, Mutex},
};
use tracing::{error, info};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    accent_alt: Color,
    muted: Color,
    selection_bg: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            accent_alt: Color::Magenta,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Browse,
    Detail,
}

enum AppEvent {
    Input(Event),
    Tick,
    Reconnected(Gallery),
    ListLoaded {
        search: Option<String>,
        result: Result<Vec<GameCard>>,
    },
    DetailLoaded {
        id: u64,
        result: Result<Option<GameDetail>>,
    },
}

struct DetailState {
    id: u64,
    title: String,
    detail: Option<GameDetail>,
    error: Option<String>,
    cursor: usize,
}

/// Terminal gallery: a card list and a per-game artwork page.
pub struct GalleryApp {
    gallery: Gallery,
    session: Arc<Mutex<Gallery>>,
    config: AppConfig,
    state: UiState,
    screen: Screen,
    detail: Option<DetailState>,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl GalleryApp {
    pub fn new(gallery: Gallery, config: AppConfig) -> Self {
        Self {
            session: Arc::new(Mutex::new(gallery.clone())),
            gallery,
            config,
            state: UiState::default(),
            screen: Screen::Browse,
            detail: None,
            event_tx: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        self.start_list_load(None);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn start_list_load(&mut self, search: Option<String>) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let session = Arc::clone(&self.session);
        let config = self.config.clone();
        self.state.loading = true;
        self.state.set_status(match &search {
            Some(text) => format!("Searching for \"{text}\"…"),
            None => "Loading games…".to_string(),
        });

        spawn(async move {
            let gallery = match fresh_gallery(&session, &config, &tx).await {
                Ok(gallery) => gallery,
                Err(err) => {
                    let _ = tx.send(AppEvent::ListLoaded { search, result: Err(err) }).await;
                    return;
                }
            };
            let result = match &search {
                Some(text) => gallery.search_games(text).await,
                None => gallery.list_games().await,
            };
            let _ = tx
                .send(AppEvent::ListLoaded {
                    search,
                    result: result.map_err(Into::into),
                })
                .await;
        });
    }

    fn start_detail_load(&mut self, card: &GameCard) {
        let Some(tx) = self.event_tx.clone() else {
            return;
        };
        let id = card.id;
        let session = Arc::clone(&self.session);
        let config = self.config.clone();
        self.detail = Some(DetailState {
            id,
            title: card.localized_name.clone(),
            detail: None,
            error: None,
            cursor: 0,
        });
        self.screen = Screen::Detail;
        self.state.set_status(format!("Loading {}…", card.localized_name));

        spawn(async move {
            let result: Result<Option<GameDetail>> =
                match fresh_gallery(&session, &config, &tx).await {
                    Ok(gallery) => gallery.game_detail(id).await.map_err(Into::into),
                    Err(err) => Err(err),
                };
            let _ = tx.send(AppEvent::DetailLoaded { id, result }).await;
        });
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            // Ticks only trigger a redraw.
            Some(AppEvent::Tick) => true,
            Some(AppEvent::Reconnected(gallery)) => {
                info!("Replaced expired IGDB access token");
                self.gallery = gallery;
                true
            }
            Some(AppEvent::ListLoaded { search, result }) => {
                self.state.loading = false;
                match result {
                    Ok(games) => {
                        info!(total = games.len(), search = search.as_deref(), "Games loaded");
                        self.state.search = search;
                        self.state.set_games(games);
                        self.state.apply_filter();
                        let message = match &self.state.search {
                            Some(text) => format!(
                                "Found {} games for \"{}\"",
                                self.state.all_games.len(),
                                text
                            ),
                            None => format!("Loaded {} games", self.state.all_games.len()),
                        };
                        self.state.set_status(message);
                    }
                    Err(err) => {
                        error!(?err, "Game list load failed");
                        self.state.set_status(format!("Failed to load games: {err}"));
                    }
                }
                true
            }
            Some(AppEvent::DetailLoaded { id, result }) => {
                let Some(state) = self.detail.as_mut().filter(|state| state.id == id) else {
                    return true;
                };
                match result {
                    Ok(Some(detail)) => {
                        state.title = detail.localized_name.clone();
                        self.state.set_status(format!(
                            "{} artworks for {}",
                            detail.artworks.len(),
                            detail.localized_name
                        ));
                        state.detail = Some(detail);
                    }
                    Ok(None) => {
                        state.error = Some(format!("Game {id} was not found"));
                        self.state.set_status(format!("Game {id} was not found"));
                    }
                    Err(err) => {
                        error!(?err, id, "Game detail load failed");
                        state.error = Some(err.to_string());
                        self.state.set_status(format!("Failed to load game {id}: {err}"));
                    }
                }
                true
            }
            None => false,
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        match self.screen {
            Screen::Browse => match self.state.mode {
                Mode::Filter => self.handle_filter_key(key),
                Mode::Browse => self.handle_browse_key(key),
            },
            Screen::Detail => self.handle_detail_key(key),
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.state.filter.clear();
                self.state.apply_filter();
                self.state.set_status("Filter cancelled".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                let text = self.state.filter.trim().to_string();
                if text.is_empty() {
                    self.state.set_status("Filter cleared".to_string());
                } else {
                    self.state.filter.clear();
                    self.start_list_load(Some(text));
                }
            }
            KeyCode::Backspace => {
                self.state.filter.pop();
                self.state.apply_filter();
                self.state
                    .set_status(format!("Filter: {}", self.state.filter));
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.state.filter.push(c);
                    self.state.apply_filter();
                    self.state
                        .set_status(format!("Filter: {}", self.state.filter));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.should_quit = true
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1),
            KeyCode::Char('g') if key.modifiers.is_empty() => self.state.select(0),
            KeyCode::Char('G') => self.state.select_last(),
            KeyCode::Home => self.state.select(0),
            KeyCode::End => self.state.select_last(),
            KeyCode::PageDown => self.state.page(1),
            KeyCode::PageUp => self.state.page(-1),
            KeyCode::Char(' ') => {
                if self.state.current_game().is_some() {
                    self.state.flipped = !self.state.flipped;
                }
            }
            KeyCode::Char('/') => {
                self.state.mode = Mode::Filter;
                self.state
                    .set_status("Type to filter, Enter to search IGDB".to_string());
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.state.loading {
                    self.state.set_status("Already loading…".to_string());
                } else {
                    self.state.filter.clear();
                    self.start_list_load(None);
                }
            }
            KeyCode::Enter => {
                if let Some(card) = self.state.current_game().cloned() {
                    self.start_detail_load(&card);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => {
                self.screen = Screen::Browse;
                self.detail = None;
                self.state.set_status("Back to games".to_string());
            }
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Right => self.move_artwork_cursor(1),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::Left => self.move_artwork_cursor(-1),
            _ => {}
        }
        Ok(())
    }

    fn move_artwork_cursor(&mut self, delta: isize) {
        let Some(state) = self.detail.as_mut() else {
            return;
        };
        let total = state
            .detail
            .as_ref()
            .map(|detail| detail.artworks.len())
            .unwrap_or(0);
        if total == 0 {
            return;
        }
        let idx = (state.cursor as isize + delta).clamp(0, total as isize - 1);
        state.cursor = idx as usize;
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Browse => self.draw_browse(frame),
            Screen::Detail => self.draw_detail(frame),
        }
    }

    fn draw_browse(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(4)])
            .split(size);

        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[0]);

        self.render_game_list(frame, body_chunks[0]);
        self.render_card(frame, body_chunks[1]);
        self.render_status(frame, chunks[1]);
    }

    fn draw_detail(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(size);

        self.render_detail_title(frame, chunks[0]);
        self.render_artworks(frame, chunks[1]);
        self.render_status(frame, chunks[2]);
    }

    fn render_game_list(&mut self, frame: &mut Frame, area: Rect) {
        self.state.list_height = area.height.saturating_sub(2) as usize;
        self.state.scroll_into_view();

        let mut list_state = ListState::default();
        let height = area.height.saturating_sub(2) as usize;
        let games = self.state.visible_games(height);
        if !games.is_empty() {
            let selected = self
                .state
                .cursor
                .saturating_sub(self.state.offset)
                .min(games.len().saturating_sub(1));
            list_state.select(Some(selected));
        }
        let items: Vec<ListItem> = games
            .iter()
            .enumerate()
            .map(|(idx, game)| {
                let global_index = self.state.offset + idx;
                let marker = if self.state.cursor == global_index {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let title = Span::styled(
                    game.localized_name.clone(),
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                );
                let mut line = vec![marker, title];
                if game.name != game.localized_name {
                    line.push(Span::styled(
                        format!(" · {}", game.name),
                        Style::default().fg(self.theme.muted),
                    ));
                }
                ListItem::new(Line::from(line))
            })
            .collect();

        let title = match &self.state.search {
            Some(text) => format!("Games matching \"{text}\""),
            None => "Nintendo Switch Games".to_string(),
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_card(&self, frame: &mut Frame, area: Rect) {
        let Some(game) = self.state.current_game() else {
            let message = if self.state.loading {
                "Loading…"
            } else {
                "No games available"
            };
            let paragraph = Paragraph::new(message)
                .block(Block::default().borders(Borders::ALL).title("Card"));
            frame.render_widget(paragraph, area);
            return;
        };

        let (title, lines) = if self.state.flipped {
            let mut lines = vec![Line::from(Span::styled(
                game.localized_name.clone(),
                Style::default()
                    .fg(self.theme.accent_alt)
                    .add_modifier(Modifier::BOLD),
            ))];
            match &game.cover {
                Some(cover) => {
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled(
                        "Cover art",
                        Style::default().fg(self.theme.muted),
                    )));
                    lines.push(Line::from(self.gallery.cover_url(cover)));
                }
                None => {
                    lines.push(Line::from(Span::styled(
                        "No cover art",
                        Style::default().fg(self.theme.muted),
                    )));
                }
            }
            ("Card · back", lines)
        } else {
            let lines = vec![
                Line::from(Span::styled(
                    game.front_text().to_string(),
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    format!("IGDB #{}", game.id),
                    Style::default().fg(self.theme.muted),
                )),
            ];
            ("Card · front", lines)
        };

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_detail_title(&self, frame: &mut Frame, area: Rect) {
        let title = self
            .detail
            .as_ref()
            .map(|state| state.title.clone())
            .unwrap_or_default();
        let paragraph = Paragraph::new(Line::from(Span::styled(
            title,
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL).title("Game"))
        .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    fn render_artworks(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Artworks");
        let Some(state) = self.detail.as_ref() else {
            frame.render_widget(Paragraph::new("").block(block), area);
            return;
        };

        if let Some(message) = &state.error {
            let paragraph = Paragraph::new(Line::from(Span::styled(
                message.clone(),
                Style::default().fg(self.theme.danger),
            )))
            .block(block)
            .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let Some(detail) = &state.detail else {
            frame.render_widget(Paragraph::new("Loading…").block(block), area);
            return;
        };

        if detail.artworks.is_empty() {
            frame.render_widget(Paragraph::new("No artworks").block(block), area);
            return;
        }

        let items: Vec<ListItem> = detail
            .artworks
            .iter()
            .enumerate()
            .map(|(idx, artwork)| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("Artwork {:>2}  ", idx + 1),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::raw(self.gallery.artwork_url(artwork)),
                ]))
            })
            .collect();
        let mut list_state = ListState::default();
        list_state.select(Some(state.cursor.min(detail.artworks.len() - 1)));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.state.mode == Mode::Filter {
            format!("Filter: {}", self.state.filter)
        } else {
            self.state.status.clone()
        };
        let token = self.gallery.client().token();
        let secondary = format!(
            "Region {} • token expires {}",
            self.gallery.region(),
            token
                .expires_at()
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
        );
        let paragraph = Paragraph::new(vec![
            Line::from(primary),
            Line::from(Span::styled(secondary, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

/// Reconnect when the shared token has expired; the client never refreshes it itself.
///
/// The session lock is held across the exchange, so loads started together
/// trigger a single reconnect and all reuse its result.
async fn fresh_gallery(
    session: &Mutex<Gallery>,
    config: &AppConfig,
    tx: &mpsc::Sender<AppEvent>,
) -> Result<Gallery> {
    let mut current = session.lock().await;
    if !current.client().token().is_expired() {
        return Ok(current.clone());
    }
    let gallery = Gallery::connect(config).await?;
    *current = gallery.clone();
    drop(current);
    let _ = tx.send(AppEvent::Reconnected(gallery.clone())).await;
    Ok(gallery)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

/// Forward terminal input, or a tick when idle, until the receiver is gone.
fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        let next = match event::poll(TICK_RATE) {
            Ok(true) => event::read().map(AppEvent::Input),
            Ok(false) => Ok(AppEvent::Tick),
            Err(err) => Err(err),
        };
        let Ok(app_event) = next else {
            return;
        };
        if sender.blocking_send(app_event).is_err() {
            return;
        }
    });
}

struct UiState {
    all_games: Vec<GameCard>,
    filtered: Vec<GameCard>,
    cursor: usize,
    offset: usize,
    list_height: usize,
    filter: String,
    search: Option<String>,
    status: String,
    flipped: bool,
    loading: bool,
    mode: Mode,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            all_games: Vec::new(),
            filtered: Vec::new(),
            cursor: 0,
            offset: 0,
            list_height: 1,
            filter: String::new(),
            search: None,
            status: "Ready".to_string(),
            flipped: false,
            loading: false,
            mode: Mode::Browse,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_games(&mut self, games: Vec<GameCard>) {
        self.all_games = games;
    }

    fn apply_filter(&mut self) {
        if self.filter.trim().is_empty() {
            self.filtered = self.all_games.clone();
        } else {
            self.filtered = self
                .all_games
                .iter()
                .filter(|game| game.matches(&self.filter))
                .cloned()
                .collect();
        }
        self.cursor = 0;
        self.offset = 0;
        self.flipped = false;
    }

    /// Select the card at `index`, clamped to the list. Changing cards shows the front again.
    fn select(&mut self, index: usize) {
        let Some(last) = self.filtered.len().checked_sub(1) else {
            return;
        };
        let index = index.min(last);
        if index != self.cursor {
            self.flipped = false;
        }
        self.cursor = index;
        self.scroll_into_view();
    }

    fn move_cursor(&mut self, delta: isize) {
        self.select(self.cursor.saturating_add_signed(delta));
    }

    fn select_last(&mut self) {
        self.select(usize::MAX);
    }

    /// Move by one visible page; `direction` is `1` or `-1`.
    fn page(&mut self, direction: isize) {
        let step = self.list_height.max(1) as isize;
        self.move_cursor(direction * step);
    }

    fn visible_games(&self, height: usize) -> &[GameCard] {
        if self.filtered.is_empty() {
            return &[];
        }
        let end = (self.offset + height).min(self.filtered.len());
        &self.filtered[self.offset..end]
    }

    fn current_game(&self) -> Option<&GameCard> {
        self.filtered.get(self.cursor)
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    /// Keep the cursor inside the list and the list window around the cursor.
    fn scroll_into_view(&mut self) {
        let Some(last) = self.filtered.len().checked_sub(1) else {
            self.cursor = 0;
            self.offset = 0;
            return;
        };
        self.cursor = self.cursor.min(last);
        let height = self.list_height.max(1);
        let lowest = (self.cursor + 1).saturating_sub(height);
        self.offset = self.offset.clamp(lowest, self.cursor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: u64, name: &str, localized: &str) -> GameCard {
        GameCard {
            id,
            name: name.to_string(),
            localized_name: localized.to_string(),
            summary: None,
            cover: None,
        }
    }

    fn state_with_games() -> UiState {
        let mut state = UiState::default();
        state.set_games(vec![
            card(1, "Splatoon 3", "スプラトゥーン3"),
            card(2, "Pikmin 4", "ピクミン4"),
            card(3, "Metroid Dread", "メトロイド ドレッド"),
        ]);
        state.apply_filter();
        state.list_height = 2;
        state
    }

    #[test]
    fn filter_narrows_and_resets_cursor() {
        let mut state = state_with_games();
        state.move_cursor(2);
        assert_eq!(state.cursor, 2);

        state.filter = "pik".to_string();
        state.apply_filter();
        assert_eq!(state.filtered.len(), 1);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.current_game().map(|game| game.id), Some(2));
    }

    #[test]
    fn cursor_scrolls_window_and_unflips() {
        let mut state = state_with_games();
        state.flipped = true;
        state.move_cursor(1);
        assert!(!state.flipped);

        state.select_last();
        assert_eq!(state.cursor, 2);
        assert_eq!(state.offset, 1);
        assert_eq!(state.visible_games(2).len(), 2);

        state.move_cursor(10);
        assert_eq!(state.cursor, 2);
        state.move_cursor(-10);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.offset, 0);
    }

    #[test]
    fn paging_moves_by_visible_height() {
        let mut state = state_with_games();
        state.page(1);
        assert_eq!(state.cursor, 2);
        assert_eq!(state.offset, 1);
        state.page(-1);
        assert_eq!(state.cursor, 0);
        assert_eq!(state.offset, 0);

        state.flipped = true;
        state.select(0);
        assert!(state.flipped);
    }

    #[test]
    fn shrinking_list_pulls_cursor_back() {
        let mut state = state_with_games();
        state.select_last();
        state.filtered.truncate(1);
        state.scroll_into_view();
        assert_eq!(state.cursor, 0);
        assert_eq!(state.offset, 0);
    }

    mod reconnect {
        use std::{
            collections::HashMap,
            sync::atomic::{AtomicUsize, Ordering},
        };

        use switch_gallery_core::igdb::{AccessToken, IgdbClient};
        use tokio::{
            io::{AsyncReadExt, AsyncWriteExt},
            net::TcpListener,
        };

        use super::*;

        const TOKEN_BODY: &str =
            r#"{"access_token":"fresh","expires_in":3600,"token_type":"bearer"}"#;

        /// Token endpoint answering every connection with the same token.
        async fn token_endpoint() -> (String, Arc<AtomicUsize>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
            let addr = listener.local_addr().expect("addr");
            let exchanges = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&exchanges);
            spawn(async move {
                while let Ok((mut socket, _)) = listener.accept().await {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => request.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let reply = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                         Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                        TOKEN_BODY.len(),
                        TOKEN_BODY
                    );
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
            });
            (format!("http://{addr}/oauth2/token"), exchanges)
        }

        fn config(auth_url: &str) -> AppConfig {
            let env: HashMap<String, String> = [
                ("IGDB_API_CLIENT_ID", "id"),
                ("IGDB_API_CLIENT_SECRET", "secret"),
                ("SWITCH_GALLERY_AUTH_URL", auth_url),
            ]
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
            AppConfig::load_from(None, Some(env)).expect("config")
        }

        fn gallery_with_token(config: &AppConfig, token: AccessToken) -> Gallery {
            let client = IgdbClient::new(
                config.http_client().expect("http client"),
                &config.api_base_url,
                "id",
                token,
            )
            .expect("client");
            Gallery::new(client, config)
        }

        #[tokio::test]
        async fn valid_token_is_reused_without_exchange() {
            let (auth_url, exchanges) = token_endpoint().await;
            let config = config(&auth_url);
            let session = Mutex::new(gallery_with_token(
                &config,
                AccessToken::new("current", 3600, "bearer"),
            ));
            let (tx, mut rx) = mpsc::channel(4);

            let gallery = fresh_gallery(&session, &config, &tx).await.expect("gallery");
            assert_eq!(gallery.client().token().value(), "current");
            assert_eq!(exchanges.load(Ordering::SeqCst), 0);
            assert!(rx.try_recv().is_err());
        }

        #[tokio::test]
        async fn concurrent_loads_share_one_reconnect() {
            let (auth_url, exchanges) = token_endpoint().await;
            let config = config(&auth_url);
            let session = Mutex::new(gallery_with_token(
                &config,
                AccessToken::new("stale", 0, "bearer"),
            ));
            let (tx, mut rx) = mpsc::channel(4);

            let (first, second) = tokio::join!(
                fresh_gallery(&session, &config, &tx),
                fresh_gallery(&session, &config, &tx),
            );
            assert_eq!(first.expect("first").client().token().value(), "fresh");
            assert_eq!(second.expect("second").client().token().value(), "fresh");
            assert_eq!(exchanges.load(Ordering::SeqCst), 1);
            assert_eq!(session.lock().await.client().token().value(), "fresh");

            assert!(matches!(rx.try_recv(), Ok(AppEvent::Reconnected(_))));
            assert!(rx.try_recv().is_err());
        }
    }
}
