#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdminViewModel {
    pub keywords: Vec<String>,
    pub enabled: bool,
    pub toggle_label: &'static str,
    pub input: String,
    pub last_error: Option<String>,
    pub dirty: bool,
}
