//! `swaggen mock`: mock response bodies for every operation.

use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Instant;

use swaggen_common::{ApiUpdate, MockUpdate};

use super::{
    choose_source, choose_tags, compile_document, fetch_document, open_store, parse_document,
    record_source,
};
use crate::common::{format_elapsed_ms, run_cli_async};
use crate::settings::{Overrides, build_formatter, formatter_choice, to_compile_config};
use crate::writer::{apply, plan_mocks, preview};

/// Flags of `swaggen mock`.
#[derive(Args, Debug, Clone)]
pub struct MockArgs {
    /// URL or path of the schema document
    #[arg(short, long)]
    pub source: Option<String>,
    /// Directory the mock files are written to
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,
    /// Wrap each body as { code, msg, data }
    #[arg(long)]
    pub wrap: bool,
    /// Only mock operations with one of these tags
    #[arg(long, value_delimiter = ',', value_name = "TAG")]
    pub tags: Option<Vec<String>>,
    /// Pick the tags to mock interactively
    #[arg(long, conflicts_with = "tags")]
    pub choose: bool,
    /// Show changes without writing files
    #[arg(long)]
    pub dry_run: bool,
    /// Use stored settings instead of prompting
    #[arg(short, long)]
    pub yes: bool,
    /// rc file to use instead of ~/.swaggen/config.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Run `swaggen mock`, returning the exit code.
pub async fn run(args: MockArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

async fn run_inner(args: MockArgs) -> Result<(), String> {
    let start = Instant::now();
    let mut store = open_store(args.config.as_deref())?;
    let interactive = !args.yes && console::user_attended();

    let source = choose_source(args.source.clone(), &store, interactive)?;
    record_source(&mut store, &source);
    store.merge_mock(MockUpdate {
        root: args.out.as_ref().map(|out| out.display().to_string()),
        wrap: args.wrap.then_some(true),
    });

    let text = fetch_document(&source, &store.data().api.cookie).await?;
    let doc = parse_document(&text)?;
    let tags = choose_tags(args.tags.clone(), args.choose && interactive, &doc, &store)?;
    if tags.is_some() {
        store.merge_api(ApiUpdate {
            api_choices: tags.clone(),
            ..ApiUpdate::default()
        });
    }

    // Only the mocks are written; skip rendering request functions.
    let overrides = Overrides {
        tags,
        type_only: true,
        mock: true,
        ..Overrides::default()
    };
    let config = to_compile_config(store.data(), &overrides)?;
    let formatter = build_formatter(formatter_choice(store.data(), None)?)?;
    let output = compile_document(&doc, &config, formatter.as_ref())?;
    let Some(mocks) = output.mocks else {
        return Err("Compiler produced no mock data".to_string());
    };

    let mock_dir = Path::new(&store.data().mock.root);
    let changes = plan_mocks(mock_dir, &mocks, store.data().mock.wrap)?;

    if args.dry_run {
        print!("{}", preview(&changes));
        println!("Dry run: nothing written.");
        return Ok(());
    }

    store.save().map_err(|err| err.to_string())?;
    let summary = apply(&changes)?;
    println!(
        "✅ Wrote {} mock entries to {} in {} ({} created, {} updated, {} unchanged)",
        mocks.entries.len(),
        mock_dir.display(),
        format_elapsed_ms(start),
        summary.created,
        summary.updated,
        summary.unchanged
    );
    Ok(())
}
