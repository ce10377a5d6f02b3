fn main() {
    // Emit ESP-IDF link/search paths only when building for the espidf
    // target; host-side test builds need no sysenv output.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
