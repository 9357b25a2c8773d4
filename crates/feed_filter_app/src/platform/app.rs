use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use feed_filter_core::{normalize_keyword, update, AdminMsg, AdminState};
use feed_filter_engine::{
    bootstrap, CompiledSelectors, DegradedView, FeedView, FeedViews, RefreshMode, RonFileStore,
    Selector, SettingsStore,
};
use feed_logging::{feed_info, feed_warn};

use super::cli::{Cli, Command};
use super::effects::EffectRunner;
use super::logging;
use super::persistence::{load_page, load_selectors, read_fragment, write_filtered_page};
use super::render::{render_admin, render_page, PageSummary};

pub fn run_app() -> anyhow::Result<()> {
    let cli = <Cli as clap::Parser>::parse();
    logging::initialize(cli.log.into());

    // Documents are not Send; everything stays on this thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = RonFileStore::new(cli.settings.clone());
    let selectors = load_selectors(cli.selectors.as_deref())?
        .compile()
        .context("compiling item selectors")?;
    feed_info!("Settings file {:?}", store.path());

    match cli.command {
        Command::Filter {
            page,
            inserts,
            into,
            out,
        } => {
            let summary =
                run_filter(&store, selectors, &page, &inserts, &into, out.as_deref()).await?;
            print!("{}", render_page(&page.display().to_string(), &summary));
            Ok(())
        }
        command => run_admin(command, &store, &cli.views, &selectors).await,
    }
}

async fn run_filter(
    store: &RonFileStore,
    selectors: CompiledSelectors,
    page: &Path,
    inserts: &[PathBuf],
    into: &str,
    out: Option<&Path>,
) -> anyhow::Result<PageSummary> {
    let mut document = load_page(page)?;
    let filter = match bootstrap(&mut document, store, selectors.clone()).await {
        Ok(filter) => Some(filter),
        Err(err) => {
            feed_warn!("{} runs unfiltered: {}", page.display(), err);
            eprintln!("Warning: {} is not filtered: {err}", page.display());
            None
        }
    };

    if !inserts.is_empty() {
        let into_selector =
            Selector::parse(into).map_err(|err| anyhow!("invalid --into selector `{into}`: {err}"))?;
        let parent = document
            .select_first(&into_selector)
            .ok_or_else(|| anyhow!("no element matches `{into}` in {}", page.display()))?;
        for fragment_path in inserts {
            let fragment = read_fragment(fragment_path)?;
            let added = document.append_fragment(parent, &fragment)?;
            let batches = document.deliver_mutations();
            feed_info!(
                "Inserted {} nodes from {:?} ({} batches delivered)",
                added.len(),
                fragment_path,
                batches
            );
        }
    }

    let stats = filter
        .as_ref()
        .and_then(|filter| filter.state())
        .map(|state| state.stats());
    if let Some(out) = out {
        write_filtered_page(out, &document)?;
    }
    Ok(PageSummary::collect(&document, &selectors, stats))
}

fn command_messages(command: Command) -> (Vec<AdminMsg>, Option<PathBuf>) {
    match command {
        Command::List | Command::Filter { .. } => (Vec::new(), None),
        Command::Add { keyword } => (
            vec![AdminMsg::KeywordInputChanged(keyword), AdminMsg::AddClicked],
            None,
        ),
        Command::Remove { keyword } => match normalize_keyword(&keyword) {
            Some(keyword) => (vec![AdminMsg::KeywordClicked(keyword)], None),
            None => (Vec::new(), None),
        },
        Command::Reset => (vec![AdminMsg::ResetClicked], None),
        Command::Toggle => (vec![AdminMsg::ToggleClicked], None),
        Command::Export { out } => (vec![AdminMsg::ExportClicked], out),
    }
}

fn open_views(paths: &[PathBuf], selectors: &CompiledSelectors) -> anyhow::Result<FeedViews> {
    let mut views = FeedViews::new();
    for path in paths {
        let document = load_page(path)?;
        views.open(FeedView::new(
            path.display().to_string(),
            document,
            selectors.clone(),
        ));
    }
    Ok(views)
}

async fn run_admin(
    command: Command,
    store: &RonFileStore,
    view_paths: &[PathBuf],
    selectors: &CompiledSelectors,
) -> anyhow::Result<()> {
    let loaded = match store.get().await {
        Ok(settings) => AdminMsg::SettingsLoaded(settings),
        Err(err) => {
            feed_warn!("Could not read {:?}: {}", store.path(), err);
            AdminMsg::SettingsLoadFailed(err.to_string())
        }
    };
    let (mut state, _) = update(AdminState::new(), loaded);

    let mut views = open_views(view_paths, selectors)?;
    let mut degraded: Vec<DegradedView> = views.refresh_all(&state.settings(), RefreshMode::Reinject);

    let (msgs, export_out) = command_messages(command);
    let mut printed_export = None;
    {
        let mut runner = EffectRunner::new(store, &mut views, export_out);
        for msg in msgs {
            let (next, effects) = update(state, msg);
            state = next;
            let outcome = runner.run(effects).await;
            for feedback in outcome.feedback {
                state = update(state, feedback).0;
            }
            printed_export = printed_export.or(outcome.printed_export);
            degraded.extend(outcome.degraded);
        }
    }

    match printed_export {
        Some(json) => println!("{json}"),
        None => print!("{}", render_admin(&state.view())),
    }
    for view in views.iter() {
        let stats = view.filter().state().map(|state| state.stats());
        let summary = PageSummary::collect(view.document(), selectors, stats);
        print!("{}", render_page(view.name(), &summary));
    }
    for view in &degraded {
        eprintln!("Warning: {} is not filtered: {}", view.name, view.error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use feed_filter_core::{AdminMsg, SettingsPatch};
    use feed_filter_engine::{ItemSelectors, RonFileStore, SettingsStore};
    use tempfile::TempDir;

    use super::{command_messages, run_filter};
    use crate::platform::cli::Command;

    const PAGE: &str = r#"<html><body><div id="contents">
        <ytd-rich-item-renderer><h3 class="title">Learning React Hooks</h3></ytd-rich-item-renderer>
        <ytd-rich-item-renderer><h3 class="title">Vue Basics</h3></ytd-rich-item-renderer>
    </div></body></html>"#;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn filter_replays_each_insert_as_its_own_batch() {
        let temp = TempDir::new().unwrap();
        let page = write(&temp, "feed.html", PAGE);
        let inserts = vec![
            write(
                &temp,
                "more1.html",
                r#"<ytd-video-renderer><h3 class="title">React in 100 seconds</h3></ytd-video-renderer>"#,
            ),
            write(
                &temp,
                "more2.html",
                r#"<ytd-video-renderer><h3 class="title">Svelte tour</h3></ytd-video-renderer><ytd-video-renderer><h3 class="title">react native</h3></ytd-video-renderer>"#,
            ),
        ];
        let out = temp.path().join("filtered.html");
        let store = RonFileStore::new(temp.path().join("settings.ron"));
        block_on(store.set(SettingsPatch::keywords(vec!["react".to_string()]))).unwrap();
        let selectors = ItemSelectors::default().compile().unwrap();

        let summary = block_on(run_filter(
            &store,
            selectors,
            &page,
            &inserts,
            "#contents",
            Some(&out),
        ))
        .unwrap();

        assert_eq!(summary.items, 5);
        assert_eq!(
            summary.hidden_titles,
            vec![
                "Learning React Hooks".to_string(),
                "React in 100 seconds".to_string(),
                "react native".to_string()
            ]
        );
        let stats = summary.stats.unwrap();
        assert_eq!(stats.full_passes, 1);
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.last_batch.roots_scanned, 2);

        let written = fs::read_to_string(&out).unwrap();
        assert!(written.contains("Vue Basics"));
        assert!(written.contains("Svelte tour"));
        assert!(!written.contains("React"));
    }

    #[test]
    fn filter_with_filtering_disabled_hides_nothing() {
        let temp = TempDir::new().unwrap();
        let page = write(&temp, "feed.html", PAGE);
        let store = RonFileStore::new(temp.path().join("settings.ron"));
        block_on(store.set(SettingsPatch {
            keywords: Some(vec!["react".to_string()]),
            enabled: Some(false),
        }))
        .unwrap();
        let selectors = ItemSelectors::default().compile().unwrap();

        let summary =
            block_on(run_filter(&store, selectors, &page, &[], "#contents", None)).unwrap();

        assert_eq!(summary.items, 2);
        assert!(summary.hidden_titles.is_empty());
        assert_eq!(summary.stats, None);
    }

    #[test]
    fn insert_target_must_exist() {
        let temp = TempDir::new().unwrap();
        let page = write(&temp, "feed.html", PAGE);
        let fragment = write(&temp, "more.html", "<p>x</p>");
        let store = RonFileStore::new(temp.path().join("settings.ron"));
        let selectors = ItemSelectors::default().compile().unwrap();

        let result = block_on(run_filter(
            &store,
            selectors,
            &page,
            &[fragment],
            "#missing",
            None,
        ));

        assert!(result.is_err());
    }

    #[test]
    fn commands_map_to_admin_messages() {
        let (msgs, out) = command_messages(Command::Add {
            keyword: "React".to_string(),
        });
        assert_eq!(
            msgs,
            vec![
                AdminMsg::KeywordInputChanged("React".to_string()),
                AdminMsg::AddClicked
            ]
        );
        assert_eq!(out, None);

        let (msgs, _) = command_messages(Command::Remove {
            keyword: "  Vue ".to_string(),
        });
        assert_eq!(msgs, vec![AdminMsg::KeywordClicked("vue".to_string())]);

        let (msgs, _) = command_messages(Command::Remove {
            keyword: "   ".to_string(),
        });
        assert!(msgs.is_empty());

        let (msgs, out) = command_messages(Command::Export {
            out: Some(PathBuf::from("keywords.json")),
        });
        assert_eq!(msgs, vec![AdminMsg::ExportClicked]);
        assert_eq!(out, Some(PathBuf::from("keywords.json")));

        assert!(command_messages(Command::List).0.is_empty());
        assert_eq!(command_messages(Command::Toggle).0, vec![AdminMsg::ToggleClicked]);
        assert_eq!(command_messages(Command::Reset).0, vec![AdminMsg::ResetClicked]);
    }
}
