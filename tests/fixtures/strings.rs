/// Text helpers
#[deprecated(note = "moving to the text service")]
pub struct Strings;

impl Strings {
    pub fn upper(&self, text: String) -> String {
        text.to_uppercase()
    }

    #[deprecated = "use upper"]
    pub fn shout(&self, text: &str) -> String {
        format!("{}!", text.to_uppercase())
    }

    pub fn split(&self, text: String) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}
