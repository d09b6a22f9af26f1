use serde::{Deserialize, Serialize};

/// Where a book sits on the shelf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Read,
    #[default]
    Wishlist,
}

impl BookStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Wishlist => "wishlist",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "wishlist" => Ok(Self::Wishlist),
            _ => Err(format!("Invalid BookStatus: {s}")),
        }
    }
}
