fn main() {
    std::process::exit(step_report::run());
}
