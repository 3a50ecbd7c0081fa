use serde_json::json;

use crate::{NetworkConfig, Result, document::layer_key};

/// The formats a stored document can be exported as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    Csv,
    Tsv,
    Simple,
}

impl Format {
    /// Parses a format name, case insensitive. Anything unknown is `Json`.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "csv" => Format::Csv,
            "tsv" => Format::Tsv,
            "simple" => Format::Simple,
            _ => Format::Json,
        }
    }
}

/// Renders `config` in the given format.
pub fn export(config: &NetworkConfig, format: Format) -> Result<String> {
    let out = match format {
        Format::Json => serde_json::to_string_pretty(&json_view(config))?,
        Format::Csv => csv(config),
        Format::Tsv => tsv(config),
        Format::Simple => simple(config),
    };

    Ok(out)
}

fn json_view(config: &NetworkConfig) -> serde_json::Value {
    let last = config.layers.len().saturating_sub(1);

    let layers: Vec<_> = config
        .layers
        .iter()
        .enumerate()
        .map(|(i, layer)| {
            json!({
                "index": i,
                "neurons": layer.num_neurons,
                "is_input": i == 0,
                "is_output": i == last,
                "activation": layer.activation_function,
            })
        })
        .collect();

    let connections: Vec<_> = (0..last)
        .map(|i| {
            json!({
                "from_layer": i,
                "to_layer": i + 1,
                "weights": config.weights.get(&layer_key(i)).cloned().unwrap_or_default(),
            })
        })
        .collect();

    json!({
        "status": "success",
        "network": {
            "structure": {
                "total_layers": config.layers.len(),
                "layers": layers,
                "sample_size": config.sample_size(),
                "dataset_type": config.dataset_type,
                "biases": config.biases,
                "computed_coordinates": config.computed_coordinates,
                "input_points": config.input_points,
                "target_coordinates": config.target_coordinates,
                "training_params": config.training_params,
            },
            "connections": connections,
        }
    })
}

fn csv(config: &NetworkConfig) -> String {
    let mut lines = vec!["STRUCTURE".to_string(), "layer,neurons,activation".to_string()];
    for (i, layer) in config.layers.iter().enumerate() {
        lines.push(format!("{i},{},{}", layer.num_neurons, activation(config, i)));
    }

    section(&mut lines, &["WEIGHTS", "from_layer,to_layer,weights"]);
    for (i, weights) in present_weights(config) {
        lines.push(format!("{i},{},{}", i + 1, join(weights, "|")));
    }

    section(&mut lines, &["SAMPLE_SIZE", &config.sample_size().to_string()]);

    section(&mut lines, &["COORDINATES"]);
    lines.extend(config.computed_coordinates.iter().map(|c| join(c, ",")));

    lines.join("\n")
}

fn tsv(config: &NetworkConfig) -> String {
    let mut lines = vec![
        "# Neural Network Configuration".to_string(),
        "# Format: TSV".to_string(),
        "".to_string(),
        "STRUCTURE".to_string(),
        "Layer\tNeurons\tActivation\tType".to_string(),
    ];

    let last = config.layers.len().saturating_sub(1);
    for (i, layer) in config.layers.iter().enumerate() {
        let kind = match i {
            0 => "input",
            i if i == last => "output",
            _ => "hidden",
        };
        lines.push(format!(
            "{i}\t{}\t{}\t{kind}",
            layer.num_neurons,
            activation(config, i)
        ));
    }

    section(
        &mut lines,
        &["WEIGHTS", "FromLayer\tToLayer\tFromNeurons\tToNeurons\tValues"],
    );
    for (i, weights) in present_weights(config) {
        lines.push(format!(
            "{i}\t{}\t{}\t{}\t{}",
            i + 1,
            config.layers[i].num_neurons,
            config.layers[i + 1].num_neurons,
            join(weights, "|")
        ));
    }

    section(&mut lines, &["SAMPLE_SIZE", &config.sample_size().to_string()]);

    section(&mut lines, &["COORDINATES"]);
    lines.extend(config.computed_coordinates.iter().map(|c| join(c, "\t")));

    lines.join("\n")
}

/// `/`-separated: input activation, layer count, neuron counts, weights from the last layer pair
/// to the first, sample size, computed coordinates and target coordinates.
fn simple(config: &NetworkConfig) -> String {
    let neurons: Vec<_> = config.layers.iter().map(|l| l.num_neurons.to_string()).collect();

    let mut blocks: Vec<_> = present_weights(config)
        .map(|(_, weights)| join(weights, "|"))
        .collect();
    blocks.reverse();

    let parts = [
        activation(config, 0).to_string(),
        config.layers.len().to_string(),
        neurons.join("|"),
        blocks.join("|") + "|",
        config.sample_size().to_string(),
        points(&config.computed_coordinates),
        points(&config.target_coordinates),
    ];

    parts.join("/")
}

/// Starts a new section after a blank line.
fn section(lines: &mut Vec<String>, header: &[&str]) {
    lines.push(String::new());
    lines.extend(header.iter().map(|line| line.to_string()));
}

fn present_weights(config: &NetworkConfig) -> impl Iterator<Item = (usize, &[f32])> {
    (0..config.layers.len().saturating_sub(1))
        .filter_map(move |i| config.weights.get(&layer_key(i)).map(|w| (i, w.as_slice())))
}

fn activation(config: &NetworkConfig, layer: usize) -> &'static str {
    config
        .layers
        .get(layer)
        .and_then(|l| l.activation_function)
        .map_or("none", |act_fn| act_fn.name())
}

/// Every point as `x,y,z|`, or nothing.
fn points(coords: &[Vec<f32>]) -> String {
    if coords.is_empty() {
        return String::new();
    }

    let points: Vec<_> = coords.iter().map(|c| join(c, ",")).collect();
    points.join("|") + "|"
}

fn join(values: &[f32], sep: &str) -> String {
    values.iter().map(|&v| number(v)).collect::<Vec<_>>().join(sep)
}

/// Whole numbers keep a trailing `.0`, as the exports have always written them.
fn number(v: f32) -> String {
    if v.is_finite() && v.fract() == 0. {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}
