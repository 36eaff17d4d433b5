use anyhow::Result;
use tracing::info;

use crate::{NewManufacturer, NewProduct, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub categories: usize,
    pub manufacturers: usize,
    pub products: usize,
}

struct SeedProduct {
    name: &'static str,
    simple_name: &'static str,
    category: &'static str,
    manufacturer: &'static str,
    description: &'static str,
    features: &'static [(&'static str, &'static [&'static str])],
}

const CATEGORIES: &[(&str, &str)] = &[
    ("Access Gates", "Single and double wing access gates for lobbies and secured entrances."),
    ("Access Security", "Entry control equipment for offices, transit and public buildings."),
    ("Appliances", "Kitchen and laundry appliances, from refrigerators to washers and dryers."),
    ("AV", ""),
    ("Cable Tray", ""),
    ("Ceilings", "Acoustic and decorative ceiling panels and systems."),
    ("Dishwashers", "Built-in and portable dishwashers."),
    ("Flooring", "Commercial and residential flooring products."),
    ("Optical Turnstiles", "Barrier and barrier-free optical turnstiles for managed entry."),
    ("Paints & Coatings", "Architectural paints, primers and specialty coatings."),
    ("Ranges", "Ranges, cooktops and wall ovens."),
    ("Revolving Doors", "Manual and automatic revolving doors."),
];

const MANUFACTURERS: &[NewManufacturer<'static>] = &[
    NewManufacturer {
        name: "Armstrong Flooring",
        phone: Some("+1-888-276-7876"),
        address: Some("2500 Columbia Ave, Lancaster, PA 17603, United States"),
        description: Some("Designer and manufacturer of commercial flooring."),
    },
    NewManufacturer {
        name: "Behr",
        phone: Some("+1-714-545-7101"),
        address: Some("3400 W. Segerstrom Avenue, Santa Ana, CA 92704, United States"),
        description: Some("Architectural and professional grade paints and primers."),
    },
    NewManufacturer {
        name: "Boon Edam USA",
        phone: Some("+1-910-814-3800"),
        address: Some("402 McKinney Parkway, Lillington, NC 27546, United States"),
        description: Some("Entry solutions for office buildings, airports and hotels."),
    },
    NewManufacturer {
        name: "Chalfant",
        phone: None,
        address: None,
        description: None,
    },
    NewManufacturer {
        name: "Delta Turnstiles",
        phone: None,
        address: None,
        description: Some("American manufacturer of optical turnstiles based in Concord, California."),
    },
    NewManufacturer {
        name: "Homasote",
        phone: None,
        address: None,
        description: None,
    },
    NewManufacturer {
        name: "Kenmore",
        phone: None,
        address: None,
        description: None,
    },
    NewManufacturer {
        name: "National Gypsum",
        phone: None,
        address: None,
        description: None,
    },
];

const LINKS: &[(&str, &str)] = &[
    ("Access Security", "Boon Edam USA"),
    ("Access Security", "Delta Turnstiles"),
    ("Appliances", "Kenmore"),
    ("Cable Tray", "Chalfant"),
    ("Ceilings", "Homasote"),
    ("Flooring", "Armstrong Flooring"),
    ("Paints & Coatings", "Behr"),
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Speed lane Slide by Boon Edam USA",
        simple_name: "Speed lane Slide",
        category: "Optical Turnstiles",
        manufacturer: "Boon Edam USA",
        description: "A speed gate that guides authorized users through to the secured areas of a building.",
        features: &[
            ("height", &["40 3/4 inches"]),
            ("width", &["12 1/4 inches", "20 1/8 inches"]),
            ("color", &["black", "white", "gray"]),
        ],
    },
    SeedProduct {
        name: "Speed lane Open by Boon Edam USA",
        simple_name: "Speed lane Open",
        category: "Optical Turnstiles",
        manufacturer: "Boon Edam USA",
        description: "A barrier free optical turnstile that channels the flow of people through a lobby.",
        features: &[
            ("width", &["6 1/4 inches"]),
            ("length", &["30 inches"]),
            ("color", &["black", "white", "gray"]),
        ],
    },
    SeedProduct {
        name: "24 inch Built-In Dishwasher by Kenmore",
        simple_name: "24 inch Built-In Dishwasher",
        category: "Dishwashers",
        manufacturer: "Kenmore",
        description: "A built-in dishwasher with a spiral spray arm and a monthly-clean filter.",
        features: &[
            ("finish", &["Stainless Steel"]),
            ("height", &["33 1/2 inches to 34 1/2 inches"]),
            ("width", &["24 inches"]),
        ],
    },
    SeedProduct {
        name: "28 inch Dishwasher by Kenmore",
        simple_name: "28 inch Dishwasher",
        category: "Dishwashers",
        manufacturer: "Kenmore",
        description: "",
        features: &[("finish", &["White", "Black"]), ("width", &["28 inches"])],
    },
    SeedProduct {
        name: "30 inch Electric Self-Clean Single Wall Oven by Kenmore",
        simple_name: "30 inch Electric Self-Clean Single Wall Oven",
        category: "Ranges",
        manufacturer: "Kenmore",
        description: "",
        features: &[("finish", &["Stainless Steel"]), ("capacity", &["5.1 cubic feet"])],
    },
    SeedProduct {
        name: "SPEEDHIDE Interior Flat Latex by National Gypsum",
        simple_name: "SPEEDHIDE Interior Flat Latex",
        category: "Paints & Coatings",
        manufacturer: "National Gypsum",
        description: "A low odor professional interior latex designed for high hiding.",
        features: &[("paint type", &["Latex"])],
    },
    SeedProduct {
        name: "Delta 7000-B by Delta Turnstiles",
        simple_name: "Delta 7000-B",
        category: "Optical Turnstiles",
        manufacturer: "Delta Turnstiles",
        description: "An optical turnstile with swinging barrier arms for added deterrence.",
        features: &[
            ("height", &["38 inches"]),
            ("width", &["7 inches"]),
            ("length", &["42 inches", "48 inches"]),
        ],
    },
    SeedProduct {
        name: "Delta 5000-SG by Delta Turnstiles",
        simple_name: "Delta 5000-SG",
        category: "Optical Turnstiles",
        manufacturer: "Delta Turnstiles",
        description: "A bi-directional optical turnstile with swinging glass barrier panels.",
        features: &[
            ("height", &["38 inches"]),
            ("width", &["6 1/4 inches"]),
            ("length", &["48 inches", "56 inches"]),
        ],
    },
    SeedProduct {
        name: "Speed lane Swing by Boon Edam USA",
        simple_name: "Speed lane Swing",
        category: "Optical Turnstiles",
        manufacturer: "Boon Edam USA",
        description: "An optical turnstile with swing barriers from the Lifeline series.",
        features: &[
            ("height", &["40 3/4 inches"]),
            ("width", &["4 1/8 inches"]),
            ("color", &["black", "white", "gray"]),
        ],
    },
    SeedProduct {
        name: "Tournex by Boon Edam USA",
        simple_name: "Tournex",
        category: "Revolving Doors",
        manufacturer: "Boon Edam USA",
        description: "",
        features: &[("color", &["black"])],
    },
    SeedProduct {
        name: "Winglock Swing by Boon Edam USA",
        simple_name: "Winglock Swing",
        category: "Access Gates",
        manufacturer: "Boon Edam USA",
        description: "A slim single wing access gate.",
        features: &[("color", &["black", "white"])],
    },
];

impl Storage {
    /// Loads the demo catalog. Safe to run repeatedly; existing rows are updated in place.
    pub async fn seed_demo_catalog(&self) -> Result<SeedSummary> {
        for &(name, description) in CATEGORIES {
            self.insert_category(name, Some(description).filter(|d| !d.is_empty()))
                .await?;
        }

        for manufacturer in MANUFACTURERS {
            self.insert_manufacturer(manufacturer).await?;
        }

        for &(category, manufacturer) in LINKS {
            self.link_category_manufacturer(category, manufacturer)
                .await?;
        }

        for product in PRODUCTS {
            let product_id = self
                .insert_product(&NewProduct {
                    name: product.name,
                    simple_name: Some(product.simple_name),
                    category: Some(product.category),
                    manufacturer: Some(product.manufacturer),
                    description: Some(product.description).filter(|d| !d.is_empty()),
                })
                .await?;
            for &(feature, values) in product.features {
                self.add_product_feature(product_id, feature, values)
                    .await?;
            }
        }

        let summary = SeedSummary {
            categories: CATEGORIES.len(),
            manufacturers: MANUFACTURERS.len(),
            products: PRODUCTS.len(),
        };
        info!(
            categories = summary.categories,
            manufacturers = summary.manufacturers,
            products = summary.products,
            "demo catalog seeded"
        );
        Ok(summary)
    }
}
