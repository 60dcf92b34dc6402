use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The closed set of nutrient keys tracked by the diary. Keys outside this
/// set arriving from upstream are dropped at the deserialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Nutrient {
    Calories,
    ProteinG,
    CarbohydratesG,
    FiberG,
    FatG,
    FolateMcg,
    IronMg,
    CalciumMg,
    VitaminDIu,
    VitaminCMg,
    VitaminAMcg,
    VitaminB12Mcg,
    ZincMg,
    Omega3G,
}

impl Nutrient {
    pub const COUNT: usize = 14;

    pub const ALL: [Nutrient; Self::COUNT] = [
        Nutrient::Calories,
        Nutrient::ProteinG,
        Nutrient::CarbohydratesG,
        Nutrient::FiberG,
        Nutrient::FatG,
        Nutrient::FolateMcg,
        Nutrient::IronMg,
        Nutrient::CalciumMg,
        Nutrient::VitaminDIu,
        Nutrient::VitaminCMg,
        Nutrient::VitaminAMcg,
        Nutrient::VitaminB12Mcg,
        Nutrient::ZincMg,
        Nutrient::Omega3G,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::ProteinG => "protein_g",
            Nutrient::CarbohydratesG => "carbohydrates_g",
            Nutrient::FiberG => "fiber_g",
            Nutrient::FatG => "fat_g",
            Nutrient::FolateMcg => "folate_mcg",
            Nutrient::IronMg => "iron_mg",
            Nutrient::CalciumMg => "calcium_mg",
            Nutrient::VitaminDIu => "vitamin_d_iu",
            Nutrient::VitaminCMg => "vitamin_c_mg",
            Nutrient::VitaminAMcg => "vitamin_a_mcg",
            Nutrient::VitaminB12Mcg => "vitamin_b12_mcg",
            Nutrient::ZincMg => "zinc_mg",
            Nutrient::Omega3G => "omega3_g",
        }
    }

    pub fn from_key(key: &str) -> Option<Nutrient> {
        Self::ALL.into_iter().find(|n| n.key() == key)
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for Nutrient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Nutrient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Nutrient::from_key(&key)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown nutrient key: {key}")))
    }
}

/// Dense amounts over the full nutrient key set. Absent keys are zero and
/// amounts never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NutrientVector {
    amounts: [f64; Nutrient::COUNT],
}

impl NutrientVector {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        self.amounts[nutrient as usize]
    }

    pub fn set(&mut self, nutrient: Nutrient, amount: f64) {
        self.amounts[nutrient as usize] = amount.max(0.0);
    }

    pub fn with(mut self, nutrient: Nutrient, amount: f64) -> Self {
        self.set(nutrient, amount);
        self
    }

    /// Elementwise sum of `other` into `self`.
    pub fn accumulate(&mut self, other: &NutrientVector) {
        for nutrient in Nutrient::ALL {
            self.amounts[nutrient as usize] += other.get(nutrient);
        }
    }

    /// Elementwise scalar multiple.
    pub fn scaled(&self, factor: f64) -> NutrientVector {
        let mut out = NutrientVector::zero();
        for nutrient in Nutrient::ALL {
            out.set(nutrient, self.get(nutrient) * factor);
        }
        out
    }

    /// Elementwise subtraction, floored at zero per key. A supplement cannot
    /// turn a requirement negative.
    pub fn minus_floor(&self, other: &NutrientVector) -> NutrientVector {
        let mut out = NutrientVector::zero();
        for nutrient in Nutrient::ALL {
            out.set(nutrient, (self.get(nutrient) - other.get(nutrient)).max(0.0));
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        self.amounts.iter().all(|a| *a == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
        Nutrient::ALL.into_iter().map(move |n| (n, self.get(n)))
    }

    /// Builds a vector from string-keyed entries. Unknown keys are dropped,
    /// never rejected; negative amounts are clamped to zero.
    pub fn from_entries<'a, I>(entries: I) -> NutrientVector
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut out = NutrientVector::zero();
        for (key, amount) in entries {
            if let Some(nutrient) = Nutrient::from_key(key) {
                out.amounts[nutrient as usize] += amount.max(0.0);
            }
        }
        out
    }
}

impl Serialize for NutrientVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Always emit the full key set so consumers never have to treat
        // absence specially.
        let mut map = serializer.serialize_map(Some(Nutrient::COUNT))?;
        for (nutrient, amount) in self.iter() {
            map.serialize_entry(nutrient.key(), &amount)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NutrientVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VectorVisitor;

        impl<'de> Visitor<'de> for VectorVisitor {
            type Value = NutrientVector;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of nutrient keys to amounts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, f64)> = Vec::new();
                while let Some(entry) = access.next_entry::<String, f64>()? {
                    entries.push(entry);
                }
                Ok(NutrientVector::from_entries(
                    entries.iter().map(|(key, amount)| (key.as_str(), *amount)),
                ))
            }
        }

        deserializer.deserialize_map(VectorVisitor)
    }
}
