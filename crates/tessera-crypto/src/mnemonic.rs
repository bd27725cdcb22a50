use argon2::Argon2;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::keys::KeyPair;

/// Number of words in a generated mnemonic. Each word encodes one byte.
pub const MNEMONIC_WORDS: usize = 24;

/// Secret recovery phrase controlling a ledger address.
///
/// Words come from a fixed 256-entry list, so a phrase carries
/// `MNEMONIC_WORDS` bytes of entropy. The phrase is wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic {
    phrase: String,
}

impl Mnemonic {
    /// Generate a fresh random mnemonic.
    pub fn generate() -> Self {
        let mut entropy = [0u8; MNEMONIC_WORDS];
        rand::rngs::OsRng.fill_bytes(&mut entropy);
        let phrase = entropy
            .iter()
            .map(|b| WORDLIST[*b as usize])
            .collect::<Vec<_>>()
            .join(" ");
        entropy.zeroize();
        Self { phrase }
    }

    /// Parse a phrase, normalising whitespace and case.
    pub fn parse(phrase: &str) -> Result<Self, CryptoError> {
        let words: Vec<String> = phrase
            .split_whitespace()
            .map(|w| w.to_ascii_lowercase())
            .collect();
        if words.len() != MNEMONIC_WORDS {
            return Err(CryptoError::InvalidMnemonic(format!(
                "expected {} words, got {}",
                MNEMONIC_WORDS,
                words.len()
            )));
        }
        if let Some(unknown) = words.iter().find(|w| !WORDLIST.contains(&w.as_str())) {
            return Err(CryptoError::InvalidMnemonic(format!(
                "unknown word '{}'",
                unknown
            )));
        }
        Ok(Self {
            phrase: words.join(" "),
        })
    }

    /// The phrase as space-separated words.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Derive the Ed25519 key pair at `coin_type / account / index`.
    ///
    /// The seed is Argon2id over the phrase, salted with the derivation path,
    /// so the same phrase always yields the same address on a given branch.
    pub fn derive_keypair(
        &self,
        coin_type: u32,
        account: u32,
        index: u32,
    ) -> Result<KeyPair, CryptoError> {
        let salt = format!("tessera/{}/{}/{}", coin_type, account, index);
        let mut seed = [0u8; 32];
        Argon2::default()
            .hash_password_into(self.phrase.as_bytes(), salt.as_bytes(), &mut seed)
            .map_err(|e| CryptoError::KeyDerivationError(format!("argon2 failed: {}", e)))?;
        let keypair = KeyPair::from_seed(&seed);
        seed.zeroize();
        tracing::debug!(coin_type, account, index, "derived key pair from mnemonic");
        Ok(keypair)
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Mnemonic(***)")
    }
}

const WORDLIST: [&str; 256] = [
    "acid",
    "acorn",
    "actor",
    "adobe",
    "agent",
    "alarm",
    "album",
    "alpha",
    "amber",
    "angle",
    "ankle",
    "apple",
    "apron",
    "arena",
    "argue",
    "armor",
    "arrow",
    "aspen",
    "atlas",
    "attic",
    "audio",
    "autumn",
    "avid",
    "awake",
    "bacon",
    "badge",
    "bagel",
    "baker",
    "bamboo",
    "banjo",
    "barn",
    "basil",
    "basin",
    "beach",
    "beacon",
    "bench",
    "berry",
    "bison",
    "blade",
    "blanket",
    "blaze",
    "bloom",
    "board",
    "bonus",
    "boost",
    "bottle",
    "brave",
    "bread",
    "brick",
    "bridge",
    "broom",
    "brush",
    "bucket",
    "cabin",
    "cactus",
    "camel",
    "candle",
    "canoe",
    "canvas",
    "canyon",
    "carbon",
    "cargo",
    "carpet",
    "castle",
    "cedar",
    "cellar",
    "chalk",
    "cherry",
    "chess",
    "chief",
    "cider",
    "circle",
    "citrus",
    "clay",
    "cliff",
    "clock",
    "cloud",
    "clover",
    "cobalt",
    "comet",
    "copper",
    "coral",
    "cotton",
    "crane",
    "crater",
    "crown",
    "crystal",
    "daisy",
    "dance",
    "delta",
    "denim",
    "desert",
    "diesel",
    "dinner",
    "dolphin",
    "donkey",
    "dragon",
    "drum",
    "dune",
    "dusk",
    "eagle",
    "earth",
    "easel",
    "echo",
    "elbow",
    "ember",
    "empire",
    "engine",
    "entry",
    "equal",
    "escape",
    "ethic",
    "fabric",
    "falcon",
    "feather",
    "fence",
    "ferry",
    "fiber",
    "field",
    "fig",
    "flame",
    "flint",
    "flute",
    "forest",
    "fossil",
    "fox",
    "frost",
    "fudge",
    "gadget",
    "galaxy",
    "garden",
    "garlic",
    "gecko",
    "giant",
    "ginger",
    "glacier",
    "glove",
    "goat",
    "granite",
    "grape",
    "gravel",
    "guitar",
    "habit",
    "hammer",
    "harbor",
    "harvest",
    "hazel",
    "helmet",
    "hermit",
    "hollow",
    "honey",
    "horizon",
    "hotel",
    "humble",
    "ice",
    "icon",
    "igloo",
    "indigo",
    "inlet",
    "iris",
    "island",
    "ivory",
    "jacket",
    "jaguar",
    "jasmine",
    "jelly",
    "jewel",
    "jigsaw",
    "jungle",
    "juniper",
    "kayak",
    "kernel",
    "kettle",
    "kidney",
    "kingdom",
    "kite",
    "kitten",
    "koala",
    "ladder",
    "lagoon",
    "lantern",
    "laser",
    "lemon",
    "lentil",
    "lilac",
    "linen",
    "lizard",
    "lobster",
    "locket",
    "lotus",
    "lumber",
    "magnet",
    "mango",
    "maple",
    "marble",
    "meadow",
    "melon",
    "mentor",
    "meteor",
    "mirror",
    "mosaic",
    "motor",
    "mountain",
    "muffin",
    "napkin",
    "nectar",
    "needle",
    "nickel",
    "noodle",
    "nugget",
    "oasis",
    "oatmeal",
    "ocean",
    "olive",
    "onion",
    "orbit",
    "orchid",
    "otter",
    "oyster",
    "paddle",
    "palace",
    "panda",
    "paper",
    "parrot",
    "pebble",
    "pencil",
    "pepper",
    "piano",
    "pillow",
    "pilot",
    "planet",
    "plaster",
    "pocket",
    "polar",
    "pony",
    "puzzle",
    "quartz",
    "quiver",
    "rabbit",
    "radar",
    "radish",
    "raven",
    "ribbon",
    "river",
    "rocket",
    "saddle",
    "salmon",
    "satin",
    "shadow",
    "shell",
    "silver",
    "sketch",
    "socket",
    "spider",
    "spring",
    "squid",
];
