//! Static tables the validation rules consult.

/// How a parameter value is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    /// Must parse as a number once quotes are stripped.
    Numeric,
    /// Must be wrapped in `(...)`.
    Tuple,
    /// Must be one of a fixed set of names.
    Choice(&'static [&'static str]),
}

pub const ACTIVATIONS: &[&str] = &[
    "relu", "sigmoid", "softmax", "tanh", "linear", "elu", "selu", "gelu", "swish", "silu",
    "softplus", "softsign", "exponential", "leaky_relu", "hard_sigmoid", "mish",
];

pub const PADDINGS: &[&str] = &["valid", "same"];

pub const OPTIMIZERS: &[&str] = &[
    "adam", "adamw", "sgd", "rmsprop", "adagrad", "adadelta", "adamax", "nadam", "ftrl", "lion",
];

pub const LOSSES: &[&str] = &[
    "categorical_crossentropy",
    "sparse_categorical_crossentropy",
    "binary_crossentropy",
    "mean_squared_error",
    "mse",
    "mean_absolute_error",
    "mae",
    "mean_absolute_percentage_error",
    "mean_squared_logarithmic_error",
    "huber",
    "hinge",
    "squared_hinge",
    "kl_divergence",
    "poisson",
    "cosine_similarity",
    "log_cosh",
];

/// Activations that make a layer usable as a network's output.
pub const OUTPUT_ACTIVATIONS: &[&str] = &["softmax", "sigmoid"];

/// Numeric parameters of training statements.
pub const TRAINING_NUMERIC: &[&str] = &["epochs", "batch_size", "validation_split", "learning_rate"];

/// Parameters a layer type cannot be declared without.
pub fn required_parameters(layer_type: &str) -> &'static [&'static str] {
    match layer_type {
        "Input" => &["shape"],
        "Dense" => &["units"],
        "Conv1D" | "Conv2D" | "Conv3D" | "Conv2DTranspose" | "SeparableConv2D" => &["filters", "kernel_size"],
        "DepthwiseConv2D" => &["kernel_size"],
        "Dropout" | "SpatialDropout1D" | "SpatialDropout2D" => &["rate"],
        "LSTM" | "GRU" | "SimpleRNN" => &["units"],
        "Embedding" => &["input_dim", "output_dim"],
        "Reshape" => &["target_shape"],
        _ => &[],
    }
}

/// Value class of a layer parameter, if it is checked at all.
pub fn value_class(parameter: &str) -> Option<ValueClass> {
    match parameter {
        "units" | "filters" | "rate" | "input_dim" | "output_dim" => Some(ValueClass::Numeric),
        "shape" | "kernel_size" | "pool_size" | "strides" | "target_shape" => Some(ValueClass::Tuple),
        "activation" => Some(ValueClass::Choice(ACTIVATIONS)),
        "padding" => Some(ValueClass::Choice(PADDINGS)),
        _ => None,
    }
}

/// Example value inserted by quick fixes for a missing parameter.
pub fn placeholder_for(parameter: &str) -> &'static str {
    match parameter {
        "units" => "64",
        "filters" => "32",
        "kernel_size" => "(3, 3)",
        "rate" => "0.5",
        "shape" => "(28, 28, 1)",
        "input_dim" => "10000",
        "output_dim" => "128",
        "target_shape" => "(-1,)",
        "optimizer" => "\"adam\"",
        "loss" => "\"categorical_crossentropy\"",
        "epochs" => "10",
        _ => "None",
    }
}

/// Modern replacement for a deprecated layer type.
pub fn replacement_for(layer_type: &str) -> Option<&'static str> {
    match layer_type {
        "SimpleRNN" => Some("LSTM"),
        "Convolution2D" => Some("Conv2D"),
        "Convolution1D" => Some("Conv1D"),
        _ => None,
    }
}
