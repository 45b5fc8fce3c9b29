//! Classifier training binary for the gym pose trainer
//!
//! Trains the exercise classifier on a JSON dataset of normalized
//! keypoint feature vectors.
//! Usage: cargo run --bin train -- --dataset <keypoints.json> --output models/ --epochs 30

use candle_core::{DType, Device, Result, Tensor};
use candle_nn::{linear, loss, Linear, Module, Optimizer, VarBuilder, VarMap};
use clap::Parser;
use rand::seq::SliceRandom;
use std::fs;
use std::path::Path;

/// Feature-vector length the runtime normalizer produces (12 joints x 3)
const INPUT_SIZE: usize = 36;

/// Output-head label ordering; must match the runtime label set
const EXERCISE_LABELS: [&str; 10] = [
    "squats",
    "lunges",
    "bicep_curls",
    "situps",
    "pushups",
    "tricep_extensions",
    "dumbbell_rows",
    "jumping_jacks",
    "dumbbell_shoulder_press",
    "lateral_shoulder_raises",
];

#[derive(Parser, Debug)]
#[command(name = "Gym Pose Trainer - Classifier Training")]
#[command(about = "Train the exercise classifier on normalized keypoint vectors")]
struct Args {
    /// Path to training dataset (JSON)
    #[arg(short, long)]
    dataset: String,

    /// Output directory for model weights
    #[arg(short, long, default_value = "models")]
    output: String,

    /// Number of training epochs
    #[arg(short, long, default_value = "30")]
    epochs: usize,

    /// Batch size
    #[arg(short, long, default_value = "64")]
    batch_size: usize,

    /// Learning rate
    #[arg(short, long, default_value = "0.001")]
    learning_rate: f64,

    /// Hidden dimension
    #[arg(long, default_value = "64")]
    hidden_dim: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Artifact header; field layout must match the runtime loader
#[derive(serde::Serialize, serde::Deserialize)]
struct ClassifierConfig {
    input_size: usize,
    hidden_size: usize,
    label_count: usize,
}

#[derive(serde::Deserialize)]
struct Dataset {
    samples: Vec<Sample>,
}

#[derive(serde::Deserialize)]
struct Sample {
    label: String,
    features: Vec<f32>,
}

/// Load the dataset and convert labels to output-head indices
fn load_examples(path: &str, verbose: bool) -> std::io::Result<Vec<(Vec<f32>, u32)>> {
    let content = fs::read_to_string(path)?;
    let dataset: Dataset = serde_json::from_str(&content)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

    let mut examples = Vec::new();
    let mut skipped = 0;
    for sample in dataset.samples {
        let label_index = EXERCISE_LABELS.iter().position(|&l| l == sample.label);
        match label_index {
            Some(index) if sample.features.len() == INPUT_SIZE => {
                examples.push((sample.features, index as u32));
            }
            _ => {
                skipped += 1;
                if verbose {
                    eprintln!(
                        "   Warning: skipping sample (label: {}, features: {})",
                        sample.label,
                        sample.features.len()
                    );
                }
            }
        }
    }

    if skipped > 0 {
        eprintln!("   Skipped {} malformed samples", skipped);
    }
    if examples.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "dataset contains no usable samples",
        ));
    }
    Ok(examples)
}

/// Group shuffled examples into minibatches: (inputs, targets)
fn create_batches(
    examples: &[(Vec<f32>, u32)],
    batch_size: usize,
) -> Vec<(Vec<f32>, Vec<u32>)> {
    let mut minibatches = Vec::new();
    for chunk in examples.chunks(batch_size) {
        let inputs: Vec<f32> = chunk.iter().flat_map(|(x, _)| x.iter().copied()).collect();
        let targets: Vec<u32> = chunk.iter().map(|(_, y)| *y).collect();
        minibatches.push((inputs, targets));
    }
    minibatches
}

/// MLP matching the runtime classifier: input -> hidden (ReLU) -> labels
struct ClassifierModel {
    hidden: Linear,
    output: Linear,
}

impl ClassifierModel {
    fn new(vs: VarBuilder, hidden_dim: usize) -> Result<Self> {
        let hidden = linear(INPUT_SIZE, hidden_dim, vs.pp("hidden"))?;
        let output = linear(hidden_dim, EXERCISE_LABELS.len(), vs.pp("output"))?;
        Ok(Self { hidden, output })
    }

    fn forward(&self, inputs: &Tensor) -> Result<Tensor> {
        // Input: (batch_size, INPUT_SIZE)
        let x = self.hidden.forward(inputs)?.relu()?;
        self.output.forward(&x)
    }
}

/// Training step with gradient descent
fn train_step(
    model: &ClassifierModel,
    optimizer: &mut candle_nn::AdamW,
    inputs: &Tensor,
    targets: &Tensor,
) -> Result<f32> {
    let logits = model.forward(inputs)?;
    let loss = loss::cross_entropy(&logits, targets)?;
    optimizer.backward_step(&loss)?;
    loss.to_vec0::<f32>()
}

/// Flatten the trained variables into the runtime weight layout:
/// w1 (input x hidden), b1, w2 (hidden x labels), b2
fn flatten_weights(varmap: &VarMap, hidden_dim: usize) -> std::io::Result<Vec<f32>> {
    let data = varmap.data().lock().unwrap();
    let label_count = EXERCISE_LABELS.len();

    let tensor_2d = |name: &str| -> std::io::Result<Vec<Vec<f32>>> {
        data.get(name)
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("missing variable {}", name),
                )
            })?
            .to_vec2::<f32>()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    };
    let tensor_1d = |name: &str| -> std::io::Result<Vec<f32>> {
        data.get(name)
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("missing variable {}", name),
                )
            })?
            .to_vec1::<f32>()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    };

    // candle Linear stores weights as (out, in); the runtime multiplies
    // input @ w, so transpose while flattening
    let hidden_w = tensor_2d("hidden.weight")?;
    let output_w = tensor_2d("output.weight")?;

    let mut flat = Vec::with_capacity(
        INPUT_SIZE * hidden_dim + hidden_dim + hidden_dim * label_count + label_count,
    );
    for i in 0..INPUT_SIZE {
        for row in hidden_w.iter().take(hidden_dim) {
            flat.push(row[i]);
        }
    }
    flat.extend(tensor_1d("hidden.bias")?);
    for h in 0..hidden_dim {
        for row in output_w.iter().take(label_count) {
            flat.push(row[h]);
        }
    }
    flat.extend(tensor_1d("output.bias")?);

    Ok(flat)
}

/// Serialize the artifact the runtime classifier loads
fn save_model(model_path: &str, hidden_dim: usize, varmap: &VarMap) -> std::io::Result<()> {
    let config = ClassifierConfig {
        input_size: INPUT_SIZE,
        hidden_size: hidden_dim,
        label_count: EXERCISE_LABELS.len(),
    };
    let flat = flatten_weights(varmap, hidden_dim)?;

    let serialized = bincode::serialize(&(config, flat))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    fs::write(model_path, serialized)?;
    Ok(())
}

/// Save the label ordering next to the weights
fn save_labels_json(output_dir: &str) -> std::io::Result<()> {
    let labels_path = Path::new(output_dir).join("labels.json");
    let labels_json = serde_json::json!({
        "version": "0.1.0",
        "label_count": EXERCISE_LABELS.len(),
        "labels": EXERCISE_LABELS,
    });
    fs::write(labels_path, serde_json::to_string_pretty(&labels_json)?)?;
    Ok(())
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();

    println!("🏋️ Gym Pose Trainer - Classifier Training");
    println!("==========================================\n");

    // Load dataset
    println!("📚 Loading dataset from: {}", args.dataset);
    let mut examples = load_examples(&args.dataset, args.verbose)?;
    println!("   Loaded {} samples", examples.len());

    // Shuffle and split into train/validation (90/10)
    let mut rng = rand::thread_rng();
    examples.shuffle(&mut rng);
    let split_idx = (examples.len() as f32 * 0.9) as usize;
    let (train_examples, val_examples) = examples.split_at(split_idx.max(1));
    println!(
        "   Train: {} | Validation: {}",
        train_examples.len(),
        val_examples.len()
    );

    let train_batches = create_batches(train_examples, args.batch_size);
    let val_batches = create_batches(val_examples, args.batch_size);

    // Setup device (Metal GPU on macOS, CPU elsewhere)
    #[cfg(target_os = "macos")]
    let device = Device::new_metal(0).unwrap_or(Device::Cpu);
    #[cfg(not(target_os = "macos"))]
    let device = Device::Cpu;

    println!("\n🧠 Initializing classifier...");
    println!("   Device: {:?}", device);
    println!(
        "   Shape: {} -> {} -> {} labels",
        INPUT_SIZE,
        args.hidden_dim,
        EXERCISE_LABELS.len()
    );

    let varmap = VarMap::new();
    let vs = VarBuilder::from_varmap(&varmap, DType::F32, &device);

    let model = match ClassifierModel::new(vs, args.hidden_dim) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("❌ Failed to create model: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Model creation failed: {}", e),
            ));
        }
    };

    let mut optimizer = candle_nn::AdamW::new(
        varmap.all_vars(),
        candle_nn::ParamsAdamW {
            lr: args.learning_rate,
            ..Default::default()
        },
    )
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    // Training loop
    println!("\n🎓 Training for {} epochs...", args.epochs);
    let start_time = std::time::Instant::now();
    let mut best_val_loss = f32::INFINITY;

    fs::create_dir_all(&args.output)?;

    for epoch in 1..=args.epochs {
        let mut total_loss = 0.0;
        let mut batch_count = 0;

        for (batch_idx, (inputs, targets)) in train_batches.iter().enumerate() {
            let batch_len = targets.len();
            match (
                Tensor::from_slice(inputs, (batch_len, INPUT_SIZE), &device),
                Tensor::from_slice(targets, batch_len, &device),
            ) {
                (Ok(input_tensor), Ok(target_tensor)) => {
                    match train_step(&model, &mut optimizer, &input_tensor, &target_tensor) {
                        Ok(loss) => {
                            total_loss += loss;
                            batch_count += 1;
                        }
                        Err(e) => {
                            if args.verbose {
                                eprintln!("   Warning: batch {} training error: {}", batch_idx, e);
                            }
                        }
                    }
                }
                (Err(e), _) | (_, Err(e)) => {
                    if args.verbose {
                        eprintln!(
                            "   Warning: batch {} tensor creation error: {}",
                            batch_idx, e
                        );
                    }
                }
            }
        }

        let train_loss = if batch_count > 0 {
            total_loss / batch_count as f32
        } else {
            0.0
        };

        // Validation phase
        let mut val_loss_total = 0.0;
        let mut val_count = 0;

        for (inputs, targets) in val_batches.iter() {
            let batch_len = targets.len();
            if let (Ok(input_tensor), Ok(target_tensor)) = (
                Tensor::from_slice(inputs, (batch_len, INPUT_SIZE), &device),
                Tensor::from_slice(targets, batch_len, &device),
            ) {
                if let Ok(logits) = model.forward(&input_tensor) {
                    if let Ok(loss) = loss::cross_entropy(&logits, &target_tensor) {
                        if let Ok(loss_val) = loss.to_vec0::<f32>() {
                            val_loss_total += loss_val;
                            val_count += 1;
                        }
                    }
                }
            }
        }

        let val_loss = if val_count > 0 {
            val_loss_total / val_count as f32
        } else {
            0.0
        };

        // Track best validation loss and save checkpoint
        let improved = if val_loss < best_val_loss {
            best_val_loss = val_loss;
            let best_path = Path::new(&args.output).join("classifier_best.bin");
            if let Err(e) = save_model(best_path.to_str().unwrap(), args.hidden_dim, &varmap) {
                eprintln!("      Warning: Failed to save best checkpoint: {}", e);
            }
            " 🌟 (saved)"
        } else {
            ""
        };

        println!(
            "   ✓ Epoch {}/{}: train_loss={:.6}, val_loss={:.6}{}",
            epoch, args.epochs, train_loss, val_loss, improved
        );
    }

    let total_time = start_time.elapsed();
    println!(
        "\n⏱️  Total training time: {:.2}s",
        total_time.as_secs_f32()
    );

    // Save final model weights
    println!("\n💾 Saving final model weights...");
    let model_path = Path::new(&args.output).join("classifier_weights.bin");
    save_model(model_path.to_str().unwrap(), args.hidden_dim, &varmap)?;
    println!("   Final model: {}", model_path.display());
    println!(
        "   Best model: {}/classifier_best.bin (val_loss={:.6})",
        args.output, best_val_loss
    );

    // Save label ordering
    save_labels_json(&args.output)?;
    println!("   Labels saved to: {}/labels.json", args.output);

    println!("\n✅ Training complete!");

    Ok(())
}
