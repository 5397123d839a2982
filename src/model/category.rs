use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    Women,
    Men,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Women, Category::Men];

    /// Roster gender token to category. Unrecognised tokens stay
    /// uncategorised.
    pub fn from_gender(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "F" | "W" | "WOMEN" | "FEMALE" => Some(Category::Women),
            "M" | "MEN" | "MALE" => Some(Category::Men),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Women => "Women",
            Category::Men => "Men",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/category.rs"]
mod tests;
