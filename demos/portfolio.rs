//! Portfolio Example - lazy text loading on a scrolling page
//!
//! A one-page portfolio of stacked sections. Each section fetches its texts
//! only when it scrolls near the terminal viewport; switching language
//! refetches what has been seen.
//!
//! - Interactive (TTY): j/k, arrows, PageUp/PageDown, mouse wheel scroll,
//!   `l` cycles the language, `q` quits
//! - Otherwise: runs a scripted scroll-through and prints what loaded when
//!
//! Run with: RUST_LOG=folio_texts=debug cargo run --example portfolio

use std::io::{stdout, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use folio_texts::viewport::terminal::{disable_mouse, enable_mouse, poll_event, route_event};
use folio_texts::{
    CatalogBackend, CoordinatorConfig, LanguageSelector, LocalizedText, Placement, Rect, Result,
    Scheduler, ScrollTracker, TextCatalog, TextLoadCoordinator, ViewportEvents, ViewportSize,
};
use tracing_subscriber::EnvFilter;

const CATALOG: &str = r#"
[en]
"lang.en" = "English"
"lang.fr" = "Français"
"hero.title" = "Hi, I'm Sam"
"hero.subtitle" = "I build fast, quiet software"
"about.title" = "About"
"about.body" = "Ten years of systems work, mostly storage and networking."
"projects.title" = "Projects"
"projects.body" = "A log-structured cache, a tiny HTTP router, this page."
"experience.title" = "Experience"
"experience.body" = "Infrastructure teams at two startups and one very large company."
"contact.title" = "Contact"
"contact.body" = "sam@example.com"

[fr]
"lang.en" = "English"
"lang.fr" = "Français"
"hero.title" = "Salut, moi c'est Sam"
"hero.subtitle" = "Je construis des logiciels rapides et discrets"
"about.title" = "À propos"
"about.body" = "Dix ans de systèmes, surtout du stockage et du réseau."
"projects.title" = "Projets"
"projects.body" = "Un cache log-structuré, un petit routeur HTTP, cette page."
"experience.title" = "Expérience"
"experience.body" = "Des équipes infrastructure dans deux startups et une très grande entreprise."
"contact.title" = "Contact"
"contact.body" = "sam@example.com"
"#;

/// (name, key prefix, top line, height)
const SECTIONS: &[(&str, &str, f64, f64)] = &[
    ("hero", "hero", 0.0, 12.0),
    ("about", "about", 30.0, 20.0),
    ("projects", "projects", 80.0, 30.0),
    ("experience", "experience", 150.0, 30.0),
    ("contact", "contact", 230.0, 10.0),
];

const PAGE_HEIGHT: f64 = 240.0;

struct Portfolio {
    scheduler: Scheduler,
    viewport: ViewportEvents,
    coordinator: TextLoadCoordinator,
    language: LanguageSelector,
    menu: Rc<LocalizedText>,
    sections: Vec<Rc<LocalizedText>>,
}

impl Portfolio {
    fn new(viewport: ViewportEvents) -> Result<Self> {
        let scheduler = Scheduler::new();
        let coordinator =
            TextLoadCoordinator::with_viewport(CoordinatorConfig::default(), &viewport, &scheduler)?;
        let catalog = TextCatalog::from_toml_str(CATALOG)?;
        let language = LanguageSelector::new(&coordinator, catalog.languages(), "en")?;
        let backend = Rc::new(CatalogBackend::new(catalog, &scheduler));

        // Language names read the same in every language
        let menu = LocalizedText::mount(
            "language-menu",
            ["lang.en", "lang.fr"],
            Placement::Viewport(Rect::from_xywh(0.0, 0.0, 20.0, 1.0)),
            backend.clone(),
            &language,
            &coordinator,
            true,
        );

        let sections = SECTIONS
            .iter()
            .map(|&(name, prefix, top, height)| {
                LocalizedText::mount(
                    name,
                    [format!("{prefix}.title"), format!("{prefix}.{}", body_key(prefix))],
                    Placement::Document {
                        rect: Rect::from_xywh(0.0, top, 80.0, height),
                        viewport: viewport.clone(),
                    },
                    backend.clone(),
                    &language,
                    &coordinator,
                    false,
                )
            })
            .collect();

        Ok(Self { scheduler, viewport, coordinator, language, menu, sections })
    }

    fn status_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "offset {:>5.1}  language {}  [{}]",
            self.viewport.scroll_offset(),
            self.language.current(),
            self.language
                .supported()
                .iter()
                .map(|code| self.menu.text(&format!("lang.{code}")).unwrap_or_else(|| code.clone()))
                .collect::<Vec<_>>()
                .join(" | "),
        )];

        for section in &self.sections {
            let state = self.coordinator.state_of(&**section).unwrap_or_default();
            let flag = match (state.loading, state.loaded) {
                (true, _) => "loading",
                (false, true) => "loaded ",
                (false, false) => "pending",
            };
            let title = section
                .keys()
                .first()
                .and_then(|key| section.text(key))
                .unwrap_or_else(|| "…".to_string());
            lines.push(format!(
                "{:<11} {flag} fetches={} {title}",
                section.name(),
                section.fetch_count()
            ));
        }
        lines
    }
}

fn body_key(prefix: &str) -> &'static str {
    if prefix == "hero" { "subtitle" } else { "body" }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let viewport = ViewportEvents::detect();
    if viewport.is_interactive() {
        return run_interactive(&Portfolio::new(viewport)?);
    }

    // No terminal: drive a simulated 80x24 viewport instead
    println!("not a terminal; simulating an 80x24 viewport");
    let simulated = ViewportEvents::interactive(ViewportSize::new(80.0, 24.0));
    run_scripted(&Portfolio::new(simulated)?)
}

// =============================================================================
// SCRIPTED RUN
// =============================================================================

fn run_scripted(portfolio: &Portfolio) -> Result<()> {
    let frame = |label: &str| {
        portfolio.scheduler.run_until_idle(Instant::now() + Duration::from_millis(50));
        println!("--- {label}");
        for line in portfolio.status_lines() {
            println!("{line}");
        }
    };

    frame("initial layout");
    for offset in [20.0, 60.0, 120.0] {
        portfolio.viewport.emit_scroll(offset);
        frame(&format!("scrolled to {offset}"));
    }
    portfolio.language.set_language("fr")?;
    frame("switched to fr");
    portfolio.viewport.emit_scroll(PAGE_HEIGHT - portfolio.viewport.size().height);
    frame("scrolled to bottom");
    Ok(())
}

// =============================================================================
// INTERACTIVE RUN
// =============================================================================

fn run_interactive(portfolio: &Portfolio) -> Result<()> {
    let size = portfolio.viewport.size();
    let mut tracker = ScrollTracker::new(size.height, PAGE_HEIGHT);

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, Hide)?;
    enable_mouse()?;

    let result = event_loop(portfolio, &mut tracker);

    disable_mouse()?;
    execute!(stdout(), Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    result
}

fn event_loop(portfolio: &Portfolio, tracker: &mut ScrollTracker) -> Result<()> {
    loop {
        portfolio.scheduler.tick(Instant::now());
        draw(portfolio)?;

        let Some(event) = poll_event(Duration::from_millis(16))? else {
            continue;
        };

        if let Event::Key(key) = &event {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('l') => {
                        portfolio.language.cycle()?;
                        continue;
                    }
                    _ => {}
                }
            }
        }

        route_event(&portfolio.viewport, tracker, &event);
    }
}

fn draw(portfolio: &Portfolio) -> Result<()> {
    let mut out = stdout();
    execute!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    for (row, line) in portfolio.status_lines().iter().enumerate() {
        execute!(out, MoveTo(0, row as u16))?;
        write!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}
