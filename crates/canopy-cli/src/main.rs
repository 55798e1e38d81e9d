use canopy::{
    CanvasPoint, LayoutStrategy, NodeKey, ScrollTarget, Size, StyleCollection, TreeLayout,
    TreeOptions,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Layout(canopy::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Layout(err) => write!(f, "invalid tree: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<canopy::Error> for CliError {
    fn from(value: canopy::Error) -> Self {
        Self::Layout(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Frames,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    options: Option<String>,
    strategy: Option<LayoutStrategy>,
    expand_all: bool,
    toggles: Vec<NodeKey>,
    viewport: Option<Size>,
    scroll_to: Option<NodeKey>,
    scale: Option<f64>,
    virtual_render: bool,
    pretty: bool,
    frames: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOut<'a> {
    strategy: LayoutStrategy,
    anchor: CanvasPoint,
    scale_ratio: f64,
    nodes: Vec<NodeOut<'a>>,
}

#[derive(Serialize)]
struct NodeOut<'a> {
    key: &'a NodeKey,
    level: usize,
    #[serde(rename = "final")]
    final_position: Option<f64>,
    expanded: bool,
    style: StyleCollection,
}

#[derive(Serialize)]
struct FramesOut {
    strategy: LayoutStrategy,
    frames: Vec<FrameOut>,
}

#[derive(Serialize)]
struct FrameOut {
    progress: f64,
    nodes: Vec<FrameNodeOut>,
}

#[derive(Serialize)]
struct FrameNodeOut {
    key: NodeKey,
    style: StyleCollection,
}

fn usage() -> &'static str {
    "canopy-cli\n\
\n\
USAGE:\n\
  canopy-cli [layout] [--options <json-file>] [--strategy <name>] [--expand-all] [--toggle <key>]... [--viewport <w>x<h>] [--scroll-to <key>] [--scale <r>] [--virtual] [--pretty] [<path>|-]\n\
  canopy-cli frames [same flags as layout] [--frames <n>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', the JSON tree is read from stdin.\n\
  - Strategies: TOP_CENTER, BOTTOM_CENTER, CENTER_LEFT, CENTER_RIGHT, TOP_LEFT_ALIGN_LEFT, TOP_LEFT_ALIGN_TOP.\n\
  - Toggles are applied in order after the initial layout; frames interpolates the last one.\n\
  - --virtual drops geometry outside the viewport (needs --viewport).\n\
  - Set CANOPY_LOG (e.g. CANOPY_LOG=debug) to control log output on stderr.\n\
"
}

fn parse_size(raw: &str) -> Option<Size> {
    let (w, h) = raw.split_once(['x', 'X'])?;
    let width = w.trim().parse::<f64>().ok()?;
    let height = h.trim().parse::<f64>().ok()?;
    (width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0)
        .then(|| Size::new(width, height))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        frames: 4,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "frames" => args.command = Command::Frames,
            "--pretty" => args.pretty = true,
            "--expand-all" => args.expand_all = true,
            "--virtual" => args.virtual_render = true,
            "--options" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.options = Some(path.clone());
            }
            "--strategy" => {
                let Some(name) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.strategy = Some(
                    name.parse::<LayoutStrategy>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--toggle" => {
                let Some(key) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.toggles.extend(key.parse::<NodeKey>());
            }
            "--scroll-to" => {
                let Some(key) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.scroll_to = key.parse::<NodeKey>().ok();
            }
            "--viewport" => {
                let Some(size) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.viewport = Some(parse_size(size).ok_or(CliError::Usage(usage()))?);
            }
            "--scale" => {
                let Some(scale) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let scale = scale.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
                if !(scale.is_finite() && scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
                args.scale = Some(scale);
            }
            "--frames" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.frames = n.parse::<usize>().map_err(|_| CliError::Usage(usage()))?;
                if args.frames == 0 {
                    return Err(CliError::Usage(usage()));
                }
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn load_options(args: &Args) -> Result<TreeOptions, CliError> {
    let mut options = match &args.options {
        Some(path) => serde_json::from_str::<TreeOptions>(&std::fs::read_to_string(path)?)?,
        None => TreeOptions::default(),
    };
    if let Some(strategy) = args.strategy {
        options.layout_strategy = strategy;
    }
    if args.expand_all {
        options.default_expand_all = true;
    }
    Ok(options)
}

/// Data trees nest one object and one array per level, so the parser's default depth limit
/// would cap them at about 64 levels.
fn parse_tree(text: &str) -> Result<Value, CliError> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let data = Value::deserialize(&mut de)?;
    de.end()?;
    Ok(data)
}

fn build_layout(args: &Args) -> Result<TreeLayout, CliError> {
    let data = parse_tree(&read_input(args.input.as_deref())?)?;
    let mut layout = TreeLayout::new(load_options(args)?);
    layout.initialize(&data)?;

    for key in &args.toggles {
        if !layout.toggle_expanded(key) {
            tracing::warn!(%key, "cannot toggle node: unknown or leaf");
        }
    }
    if let Some(size) = args.viewport {
        layout.set_viewport(size);
    }
    if let Some(scale) = args.scale {
        if !layout.rescale(scale) {
            tracing::warn!(scale, "--scale needs --viewport, ignoring");
        }
    }
    if let Some(key) = &args.scroll_to {
        if !layout.scroll_into_view(&ScrollTarget::new(key.clone())) {
            tracing::warn!(%key, "cannot scroll to node");
        }
    }
    Ok(layout)
}

fn run(args: Args) -> Result<(), CliError> {
    let layout = build_layout(&args)?;
    let strategy = layout.config().strategy;

    match args.command {
        Command::Layout => {
            let nodes = layout
                .visible_nodes(false)
                .into_iter()
                .map(|node| {
                    let style = node.style.clone().unwrap_or_default();
                    NodeOut {
                        key: &node.key,
                        level: node.level,
                        final_position: node.final_position,
                        expanded: node.expanded,
                        style: if args.virtual_render {
                            layout.virtual_render(&style)
                        } else {
                            style
                        },
                    }
                })
                .collect();
            let out = LayoutOut {
                strategy,
                anchor: layout.anchor(),
                scale_ratio: layout.scale_ratio(),
                nodes,
            };
            write_json(&out, args.pretty)
        }
        Command::Frames => {
            let keys: Vec<NodeKey> = layout
                .visible_nodes(true)
                .into_iter()
                .map(|node| node.key.clone())
                .collect();
            let frames = (0..=args.frames)
                .map(|i| {
                    let progress = i as f64 / args.frames as f64;
                    FrameOut {
                        progress,
                        nodes: keys
                            .iter()
                            .map(|key| FrameNodeOut {
                                key: key.clone(),
                                style: layout.animation_render(key, progress),
                            })
                            .collect(),
                    }
                })
                .collect();
            write_json(&FramesOut { strategy, frames }, args.pretty)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("CANOPY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
