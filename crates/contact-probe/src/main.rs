//! Contact Probe - drive the contact modal against a live server
//!
//! Builds a minimal page holding one opener link and the modal container,
//! clicks the opener, and prints what the modal shows. Field assignments on
//! the command line are typed into the loaded form before clicking submit.
//!
//! ## Usage
//!
//! ```text
//! contact-probe [--config PATH] <opener-href> [name=value ...]
//! ```
//!
//! Set RUST_LOG=debug for request-level output.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use contact_core::config::{default_config_path, load_config, ContactConfig};
use contact_core::transport::UreqTransport;
use contact_core::{ContactRuntime, Page};

const OPENER_ID: &str = "probe-opener";

#[derive(Debug, PartialEq)]
struct Args {
    config_path: PathBuf,
    href: String,
    fields: Vec<(String, String)>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut config_path = None;
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter.next().context("--config needs a path")?;
            config_path = Some(PathBuf::from(path));
        } else {
            positional.push(arg.clone());
        }
    }

    let mut positional = positional.into_iter();
    let href = positional
        .next()
        .context("usage: contact-probe [--config PATH] <opener-href> [name=value ...]")?;
    let fields = positional
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => Ok((name.to_string(), value.to_string())),
            None => bail!("field assignment {pair:?} is not name=value"),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Args {
        config_path: config_path.unwrap_or_else(default_config_path),
        href,
        fields,
    })
}

/// Page shell with the opener and an empty modal
fn shell_markup(href: &str) -> String {
    let href = href.replace('&', "&amp;").replace('"', "&quot;");
    format!(
        r#"<!DOCTYPE html>
<html><body>
  <a class="js-load-form" id="{OPENER_ID}" href="{href}">Contact us</a>
  <div class="modal fade" id="contactModal" aria-hidden="true">
    <div class="modal-dialog"><div class="modal-content"></div></div>
  </div>
</body></html>"#
    )
}

/// Point the page-level selectors at the shell; fragment selectors stay configurable
fn probe_config(mut config: ContactConfig) -> ContactConfig {
    config.selectors.scope = String::from("body");
    config.selectors.opener = String::from(".js-load-form");
    config.selectors.modal = String::from("#contactModal");
    config.selectors.modal_content = String::from(".modal-content");
    config
}

fn print_modal(runtime: &ContactRuntime) {
    let modal = &runtime.page().modal;
    println!("--- modal ({}) ---", if modal.is_visible() { "shown" } else { "hidden" });
    println!("{}", modal.content_markup());
    if let Some(alert) = modal.alert() {
        println!("!!! {}", alert);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&raw)?;
    let config = probe_config(load_config(&args.config_path));

    let page = Page::parse(&shell_markup(&args.href), &config.selectors)?;
    let transport = Arc::new(UreqTransport::from_config(&config)?);
    let mut runtime = ContactRuntime::new(page, &config, transport)?;

    let opener = runtime.page().find(&format!("#{OPENER_ID}"))?;
    runtime.click(opener);
    runtime.run_until_idle().await;
    print_modal(&runtime);

    if runtime.page().modal.content_markup() == config.messages.load_failed {
        bail!("loading {} failed", args.href);
    }
    if args.fields.is_empty() {
        return Ok(());
    }

    for (name, value) in &args.fields {
        if !runtime.page_mut().fill(name, value) {
            log::warn!("No control named {:?} in the loaded form", name);
        }
    }

    let submit = runtime.page().find(&config.selectors.submit)?;
    if runtime.click(submit).handled == 0 {
        bail!("submit control {} did not accept the click", config.selectors.submit);
    }
    runtime.step().await;
    print_modal(&runtime);

    if runtime.page().modal.alert().is_some() {
        bail!("submission failed");
    }

    // Wait out the auto-dismiss when the submission was accepted
    runtime.run_until_idle().await;
    print_modal(&runtime);
    Ok(())
}
