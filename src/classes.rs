//! PlantVillage class labels and their normalization into lookup keys.
//!
//! The order of [`CLASS_LABELS`] is the classifier's output-layer order: index
//! `i` of the logits vector is the score for `CLASS_LABELS[i]`. Any change here
//! must be matched by new weights and a new model manifest.

/// Number of classes predicted by the classifier
pub const NUM_CLASSES: usize = 38;

/// Class labels in model output order.
/// Format: "Plant___Condition", as named by the PlantVillage dataset folders.
pub const CLASS_LABELS: [&str; NUM_CLASSES] = [
    "Apple___Apple_scab",
    "Apple___Black_rot",
    "Apple___Cedar_apple_rust",
    "Apple___healthy",
    "Blueberry___healthy",
    "Cherry_(including_sour)___Powdery_mildew",
    "Cherry_(including_sour)___healthy",
    "Corn_(maize)___Cercospora_leaf_spot Gray_leaf_spot",
    "Corn_(maize)___Common_rust_",
    "Corn_(maize)___Northern_Leaf_Blight",
    "Corn_(maize)___healthy",
    "Grape___Black_rot",
    "Grape___Esca_(Black_Measles)",
    "Grape___Leaf_blight_(Isariopsis_Leaf_Spot)",
    "Grape___healthy",
    "Orange___Haunglongbing_(Citrus_greening)",
    "Peach___Bacterial_spot",
    "Peach___healthy",
    "Pepper,_bell___Bacterial_spot",
    "Pepper,_bell___healthy",
    "Potato___Early_blight",
    "Potato___Late_blight",
    "Potato___healthy",
    "Raspberry___healthy",
    "Soybean___healthy",
    "Squash___Powdery_mildew",
    "Strawberry___Leaf_scorch",
    "Strawberry___healthy",
    "Tomato___Bacterial_spot",
    "Tomato___Early_blight",
    "Tomato___Late_blight",
    "Tomato___Leaf_Mold",
    "Tomato___Septoria_leaf_spot",
    "Tomato___Spider_mites Two-spotted_spider_mite",
    "Tomato___Target_Spot",
    "Tomato___Tomato_Yellow_Leaf_Curl_Virus",
    "Tomato___Tomato_mosaic_virus",
    "Tomato___healthy",
];

/// Get the class label for a given output index
pub fn class_name(index: usize) -> Option<&'static str> {
    CLASS_LABELS.get(index).copied()
}

/// Get the output index for a given class label
pub fn class_index(label: &str) -> Option<usize> {
    CLASS_LABELS.iter().position(|&l| l == label)
}

/// Check if a class represents a healthy plant (not diseased)
pub fn is_healthy_class(index: usize) -> bool {
    CLASS_LABELS
        .get(index)
        .map(|label| label.ends_with("healthy"))
        .unwrap_or(false)
}

/// Get the plant name from a class (e.g., "Tomato" from "Tomato___Bacterial_spot")
pub fn plant_name(index: usize) -> Option<&'static str> {
    CLASS_LABELS
        .get(index)
        .and_then(|label| label.split("___").next())
}

/// Rewrite a class label into the key used by the disease table.
///
/// Lowercase, turn `___` and then `_` into `-`, split on `-`, drop the first
/// segment (the crop) and join the rest with single spaces. Punctuation is left
/// alone and empty segments are kept, so `"Pepper,_bell___Bacterial_spot"`
/// becomes `"bell bacterial spot"` and a trailing `_` leaves a trailing space.
pub fn normalize_label(label: &str) -> String {
    let lower = label.to_lowercase();
    let dashed = lower.replace("___", "-").replace('_', "-");
    dashed.split('-').skip(1).collect::<Vec<_>>().join(" ")
}

/// Lookup keys for every class, in output order
pub fn lookup_keys() -> Vec<String> {
    CLASS_LABELS.iter().map(|label| normalize_label(label)).collect()
}
