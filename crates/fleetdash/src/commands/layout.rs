//! Layout subcommand handlers.
//!
//! Each edit loads the session user, applies the change through the
//! dashboard store and flushes the debounced save before returning, so a
//! one-shot invocation still ends with the profile written.

use fleetdash_api::FleetClient;
use fleetdash_config::Config;
use fleetdash_core::{
    Dashboard, DashboardPersistence, Point, Size, Widget, WidgetKind, WidgetUpdate,
};
use serde::Serialize;
use tabled::Tabled;
use tracing::warn;

use crate::cli::{GlobalOpts, LayoutArgs, LayoutCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct WidgetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Size")]
    size: String,
}

fn widget_row(w: &Widget) -> WidgetRow {
    let kind = if w.is_inert() {
        format!("{} (inert)", w.kind)
    } else {
        w.kind.clone()
    };
    WidgetRow {
        id: w.id.clone(),
        kind,
        title: w.title.clone(),
        position: format!("{},{}", w.position.x, w.position.y),
        size: format!("{}x{}", w.size.width, w.size.height),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KindInfo {
    kind: String,
    width: u32,
    height: u32,
}

#[derive(Tabled)]
struct KindRow {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Default size")]
    size: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: LayoutArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    if matches!(args.command, LayoutCommand::Kinds) {
        return list_kinds(global);
    }

    let client = super::connect(cfg)?;
    let user = client.session().await?;
    let dashboard = Dashboard::new(DashboardPersistence::new(
        client,
        cfg.persistence_config(),
    ));
    dashboard.load(Some(user));

    apply(&dashboard, args.command)?;
    dashboard.flush().await;

    print_layout(&dashboard, global)
}

fn apply(dashboard: &Dashboard<FleetClient>, command: LayoutCommand) -> Result<(), CliError> {
    match command {
        LayoutCommand::Show | LayoutCommand::Kinds => {}

        LayoutCommand::Add { kind, title } => {
            if kind.parse::<WidgetKind>().is_err() {
                warn!(kind = %kind, "unknown widget type; it will be stored but not rendered");
            }
            let id = dashboard.add_widget(&kind, title.as_deref());
            eprintln!("Added {id}");
        }

        LayoutCommand::Remove { id } => {
            if !dashboard.remove_widget(&id) {
                return Err(CliError::WidgetNotFound { id });
            }
        }

        LayoutCommand::Move { id, x, y } => {
            require_editable(dashboard, &id, "move")?;
            dashboard.update_widget_position(&id, Point { x, y });
        }

        LayoutCommand::Resize { id, width, height } => {
            require_editable(dashboard, &id, "resize")?;
            if width == 0 || height == 0 {
                return Err(CliError::Validation {
                    field: "size".into(),
                    reason: "width and height must be positive".into(),
                });
            }
            dashboard.update_widget_size(&id, Size { width, height });
        }

        LayoutCommand::Rename { id, title } => {
            if dashboard.widget(&id).is_none() {
                return Err(CliError::WidgetNotFound { id });
            }
            dashboard.update_widget(
                &id,
                WidgetUpdate {
                    title: Some(title),
                    ..WidgetUpdate::default()
                },
            );
        }

        LayoutCommand::EditMode { state } => {
            dashboard.set_edit_mode(state.enabled());
        }

        LayoutCommand::Reset => dashboard.reset_dashboard(),
    }
    Ok(())
}

fn require_editable(
    dashboard: &Dashboard<FleetClient>,
    id: &str,
    action: &str,
) -> Result<(), CliError> {
    if dashboard.widget(id).is_none() {
        return Err(CliError::WidgetNotFound { id: id.to_owned() });
    }
    if !dashboard.edit_mode() {
        return Err(CliError::EditModeRequired {
            action: action.to_owned(),
        });
    }
    Ok(())
}

fn print_layout(dashboard: &Dashboard<FleetClient>, global: &GlobalOpts) -> Result<(), CliError> {
    let config = dashboard.config();
    let rendered = match global.output {
        OutputFormat::Table => {
            let table = output::render_list(global.output, &config.widgets, widget_row)?;
            format!(
                "{table}\nedit mode: {}  canvas height: {}",
                if config.edit_mode { "on" } else { "off" },
                dashboard.min_canvas_height()
            )
        }
        _ => output::render_single(global.output, &config, |_| String::new())?,
    };
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn list_kinds(global: &GlobalOpts) -> Result<(), CliError> {
    let kinds: Vec<KindInfo> = WidgetKind::all()
        .map(|k| {
            let size = k.default_size();
            KindInfo {
                kind: k.to_string(),
                width: size.width,
                height: size.height,
            }
        })
        .collect();

    let rendered = output::render_list(global.output, &kinds, |k| KindRow {
        kind: k.kind.clone(),
        size: format!("{}x{}", k.width, k.height),
    })?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
