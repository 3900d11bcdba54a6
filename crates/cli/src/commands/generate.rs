//! `swaggen generate`: interface and request modules, optionally mocks.

use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Instant;

use swaggen_core::{Lang, NamingPolicy};

use super::{
    choose_source, choose_tags, compile_document, fetch_document, open_store, parse_document,
    record_source,
};
use crate::common::{format_elapsed_ms, run_cli_async};
use crate::prompt::prompt_lang;
use crate::settings::{
    FormatterChoice, Overrides, build_formatter, formatter_choice, rc_updates, to_compile_config,
};
use crate::writer::{apply, plan_mocks, plan_modules, preview};

/// Flags of `swaggen generate`.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// URL or path of the schema document
    #[arg(short, long)]
    pub source: Option<String>,
    /// Output language: ts or js
    #[arg(short, long)]
    pub lang: Option<Lang>,
    /// Output directory (defaults to the stored api root)
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,
    /// Request template strategy
    #[arg(short, long)]
    pub template: Option<String>,
    /// Function naming policy: camel, pascal, snake or preserve
    #[arg(long)]
    pub naming: Option<NamingPolicy>,
    /// Only generate the interface module
    #[arg(long)]
    pub type_only: bool,
    /// Also generate mock data
    #[arg(long)]
    pub mock: bool,
    /// Formatter run over the generated modules
    #[arg(long, value_enum)]
    pub formatter: Option<FormatterChoice>,
    /// Module specifier the request module imports types from
    #[arg(long, value_name = "SPECIFIER")]
    pub interface_path: Option<String>,
    /// Only generate operations with one of these tags
    #[arg(long, value_delimiter = ',', value_name = "TAG")]
    pub tags: Option<Vec<String>>,
    /// Pick the tags to generate interactively
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

/// Run `swaggen generate`, returning the exit code.
pub async fn run(args: GenerateArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

async fn run_inner(args: GenerateArgs) -> Result<(), String> {
    let start = Instant::now();
    let mut store = open_store(args.config.as_deref())?;
    let interactive = !args.yes && console::user_attended();

    let source = choose_source(args.source.clone(), &store, interactive)?;
    let lang = match args.lang {
        Some(lang) => lang,
        None if interactive => prompt_lang(store.data().core.lang.parse().unwrap_or_default())?,
        None => store.data().core.lang.parse()?,
    };

    record_source(&mut store, &source);

    let text = fetch_document(&source, &store.data().api.cookie).await?;
    let doc = parse_document(&text)?;
    let tags = choose_tags(args.tags.clone(), args.choose && interactive, &doc, &store)?;

    let overrides = Overrides {
        lang: Some(lang),
        naming: args.naming,
        template: args.template.clone(),
        interface_import_path: args.interface_path.clone(),
        tags,
        type_only: args.type_only,
        mock: args.mock,
    };
    let (core, api) = rc_updates(&overrides, args.formatter, args.out.as_deref());
    store.merge_core(core);
    store.merge_api(api);

    let config = to_compile_config(store.data(), &overrides)?;
    let formatter = build_formatter(formatter_choice(store.data(), args.formatter)?)?;
    let output = compile_document(&doc, &config, formatter.as_ref())?;

    let out_dir = PathBuf::from(&store.data().api.root);
    let mut changes = plan_modules(&out_dir, &output);
    if let Some(mocks) = &output.mocks {
        changes.extend(plan_mocks(
            Path::new(&store.data().mock.root),
            mocks,
            store.data().mock.wrap,
        )?);
    }

    if args.dry_run {
        print!("{}", preview(&changes));
        println!("Dry run: nothing written.");
        return Ok(());
    }

    store.save().map_err(|err| err.to_string())?;
    let summary = apply(&changes)?;
    println!(
        "✅ Generated {} in {} ({} created, {} updated, {} unchanged)",
        out_dir.display(),
        format_elapsed_ms(start),
        summary.created,
        summary.updated,
        summary.unchanged
    );
    Ok(())
}
