//! The built-in vehicle coverage rule table.
//!
//! Facts describe how a vehicle was procured, which cards paid for it, where
//! it travels and what insurance was bought. Derived variables are the
//! coverage entitlements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::Schema;
use crate::types::{
    Case, DerivedDef, EnumDomain, Expr, FactDef, FactKind, FactValue, SCHEMA_VERSION, SchemaDef,
    SchemaError,
};

pub const PROCUREMENT_TYPE: &str = "procurement_type";
pub const DTEC_USED: &str = "dtec_used";
pub const IDTC_USED: &str = "idtc_used";
pub const PERSONAL_CARD_USED: &str = "personal_card_used";
pub const PERSONAL_CARD_CDW: &str = "personal_card_collision_damage_waiver";
pub const GOVERNMENT_APPROVED_SUPPLIER: &str = "government_approved_car_rental_suppliers";
pub const PLPD_PURCHASED: &str = "public_liability_and_property_damage_purchased";
pub const TRAVELLING_TO_USA: &str = "travelling_to_usa";
pub const TRAVELLING_OUTSIDE_CANADA: &str = "travelling_outside_of_canada";
pub const COMMERCIAL_INSURANCE_PURCHASED: &str = "commercial_insurance_purchased";
pub const COMMERCIAL_PUBLIC_LIABILITY_PURCHASED: &str = "commercial_public_liability_purchased";
pub const BASIC_INSURANCE_COVERAGE: &str = "basic_insurance_coverage";

pub const VEHICLE_IS_INSURED: &str = "vehicle_is_insured";
pub const COLLISION_DAMAGE_WAIVER: &str = "collision_damage_waiver";
pub const PUBLIC_LIABILITY_AND_PROPERTY_DAMAGE: &str = "public_liability_and_property_damage";

/// How a vehicle was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcurementType {
    Crown,
    Lease,
    Private,
    #[default]
    None,
}

impl ProcurementType {
    /// All members in declaration order.
    pub const ALL: [ProcurementType; 4] = [
        ProcurementType::Crown,
        ProcurementType::Lease,
        ProcurementType::Private,
        ProcurementType::None,
    ];

    /// Name of the enum domain in rule tables.
    pub const DOMAIN: &'static str = "ProcurementType";

    pub fn as_str(self) -> &'static str {
        match self {
            ProcurementType::Crown => "crown",
            ProcurementType::Lease => "lease",
            ProcurementType::Private => "private",
            ProcurementType::None => "none",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcurementType::Crown => "Crown",
            ProcurementType::Lease => "Lease",
            ProcurementType::Private => "Private",
            ProcurementType::None => "none",
        }
    }

    /// The domain descriptor for rule tables.
    pub fn domain() -> EnumDomain {
        EnumDomain {
            name: Self::DOMAIN.to_string(),
            members: Self::ALL.iter().map(|p| p.as_str().to_string()).collect(),
        }
    }
}

/// Display label for a member of a built-in domain, if it has one.
pub fn member_label(domain: &str, member: &str) -> Option<&'static str> {
    match domain {
        ProcurementType::DOMAIN => member.parse::<ProcurementType>().ok().map(ProcurementType::label),
        _ => None,
    }
}

impl fmt::Display for ProcurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcurementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown procurement type '{}'", s))
    }
}

impl From<ProcurementType> for FactValue {
    fn from(p: ProcurementType) -> Self {
        FactValue::Label(p.as_str().to_string())
    }
}

fn flag(name: &str, label: &str) -> FactDef {
    FactDef {
        name: name.to_string(),
        label: label.to_string(),
        kind: FactKind::Bool,
        default: Some(FactValue::Bool(false)),
    }
}

fn procured_as(p: ProcurementType) -> Expr {
    Expr::is(PROCUREMENT_TYPE, p.as_str())
}

/// Insured when staying home, or when going to the USA with commercial cover.
fn insured_unless_uncovered_in_usa() -> Expr {
    Expr::Any(vec![
        Expr::not(Expr::var(TRAVELLING_TO_USA)),
        Expr::All(vec![
            Expr::var(COMMERCIAL_INSURANCE_PURCHASED),
            Expr::var(TRAVELLING_TO_USA),
        ]),
    ])
}

/// Descriptor for the vehicle coverage table.
pub fn schema_def() -> SchemaDef {
    SchemaDef {
        name: "vehicles".to_string(),
        description: "Coverage entitlements for crown, leased and private vehicles".to_string(),
        version: SCHEMA_VERSION,
        domains: vec![ProcurementType::domain()],
        facts: vec![
            FactDef {
                name: PROCUREMENT_TYPE.to_string(),
                label: "Whether the vehicle is owned by the crown, leased or a private vehicle owned by the employee.".to_string(),
                kind: FactKind::Enum {
                    domain: ProcurementType::DOMAIN.to_string(),
                },
                default: Some(ProcurementType::None.into()),
            },
            flag(DTEC_USED, "did the user use their dtec card for the purchase?"),
            flag(IDTC_USED, "did the user use their idtc card for the purchase?"),
            flag(PERSONAL_CARD_USED, "did the user use their personal card for the purchase?"),
            flag(PERSONAL_CARD_CDW, "did the users personal card have Collision Damage Waiver?"),
            flag(
                GOVERNMENT_APPROVED_SUPPLIER,
                "did the user use a government approved car rental supplier?",
            ),
            flag(PLPD_PURCHASED, "did the user purchase public liability and property damage?"),
            flag(TRAVELLING_TO_USA, "is the vehicle going to the USA?"),
            flag(TRAVELLING_OUTSIDE_CANADA, "is the vehicle travelling outside of canada?"),
            flag(COMMERCIAL_INSURANCE_PURCHASED, "Has commercial insurance been purchased?"),
            flag(
                COMMERCIAL_PUBLIC_LIABILITY_PURCHASED,
                "Public Liability and Property Damage been purchased?",
            ),
            flag(BASIC_INSURANCE_COVERAGE, "does the user have basic insurance coverage?"),
        ],
        derived: vec![
            DerivedDef {
                name: VEHICLE_IS_INSURED.to_string(),
                label: "vehicle would be insured".to_string(),
                formula: Expr::Select {
                    cases: vec![
                        Case {
                            when: procured_as(ProcurementType::Crown),
                            then: insured_unless_uncovered_in_usa(),
                        },
                        Case {
                            when: procured_as(ProcurementType::Lease),
                            then: insured_unless_uncovered_in_usa(),
                        },
                        Case {
                            when: procured_as(ProcurementType::Private),
                            then: Expr::var(BASIC_INSURANCE_COVERAGE),
                        },
                    ],
                    fallback: None,
                },
            },
            DerivedDef {
                name: COLLISION_DAMAGE_WAIVER.to_string(),
                label: "Collision Damage Waiver (CDW) coverage".to_string(),
                formula: Expr::Any(vec![
                    Expr::var(DTEC_USED),
                    Expr::var(IDTC_USED),
                    Expr::var(PERSONAL_CARD_CDW),
                    procured_as(ProcurementType::Crown),
                ]),
            },
            DerivedDef {
                name: PUBLIC_LIABILITY_AND_PROPERTY_DAMAGE.to_string(),
                label: "Public Liability and Property Damage coverage".to_string(),
                formula: Expr::Any(vec![
                    Expr::var(GOVERNMENT_APPROVED_SUPPLIER),
                    Expr::All(vec![
                        Expr::var(TRAVELLING_OUTSIDE_CANADA),
                        Expr::var(COMMERCIAL_PUBLIC_LIABILITY_PURCHASED),
                    ]),
                    Expr::var(BASIC_INSURANCE_COVERAGE),
                    procured_as(ProcurementType::Crown),
                ]),
            },
        ],
        source: "builtin".to_string(),
    }
}

/// Build the vehicle table with its declared defaults.
pub fn schema() -> Result<Schema, SchemaError> {
    schema_def().build()
}
