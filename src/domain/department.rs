use chrono::{DateTime, Utc};
use serde_aux::field_attributes::{
    deserialize_number_from_string, deserialize_option_number_from_string,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepartmentStatus {
    Available,
    Occupied,
    Maintenance,
}

impl DepartmentStatus {
    pub const ALL: [DepartmentStatus; 3] = [
        DepartmentStatus::Available,
        DepartmentStatus::Occupied,
        DepartmentStatus::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DepartmentStatus::Available => "available",
            DepartmentStatus::Occupied => "occupied",
            DepartmentStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim() {
            "available" => Ok(Self::Available),
            "occupied" => Ok(Self::Occupied),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(format!("{} is not a valid department status.", other)),
        }
    }

    /// A unit under maintenance has to be released before it can be let again.
    pub fn can_transition_to(&self, next: DepartmentStatus) -> bool {
        use DepartmentStatus::*;
        match (self, next) {
            (a, b) if *a == b => true,
            (Available, Occupied) | (Available, Maintenance) => true,
            (Occupied, Available) | (Occupied, Maintenance) => true,
            (Maintenance, Available) => true,
            (Maintenance, Occupied) => false,
            _ => false,
        }
    }

    /// Leaving `occupied` unassigns every tenant of the unit.
    pub fn releases_tenants(&self, next: DepartmentStatus) -> bool {
        *self == DepartmentStatus::Occupied && next != DepartmentStatus::Occupied
    }
}

impl std::fmt::Display for DepartmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub title: String,
    pub address: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub price: f64,
    pub status: DepartmentStatus,
    pub description: Option<String>,
    pub rooms: Option<i32>,
    pub bathrooms: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub area: Option<f64>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_terrace: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub has_balcony: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub sea_view: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub parking: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub furnished: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<bool> = serde::Deserialize::deserialize(deserializer)?;
    Ok(value.unwrap_or(false))
}

impl Department {
    /// Human readable list of the feature flags that are set.
    pub fn features(&self) -> Vec<&'static str> {
        let mut features = Vec::new();
        if self.has_terrace {
            features.push("Terrace");
        }
        if self.has_balcony {
            features.push("Balcony");
        }
        if self.sea_view {
            features.push("Sea view");
        }
        if self.parking {
            features.push("Parking");
        }
        if self.furnished {
            features.push("Furnished");
        }
        features
    }

    pub fn to_draft(&self) -> DepartmentDraft {
        DepartmentDraft {
            title: self.title.clone(),
            address: self.address.clone(),
            price: self.price,
            status: self.status,
            description: self.description.clone(),
            rooms: self.rooms,
            bathrooms: self.bathrooms,
            area: self.area,
            image_url: self.image_url.clone(),
            has_terrace: self.has_terrace,
            has_balcony: self.has_balcony,
            sea_view: self.sea_view,
            parking: self.parking,
            furnished: self.furnished,
        }
    }
}

/// The writable columns of a department, used for inserts and updates.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DepartmentDraft {
    pub title: String,
    pub address: String,
    pub price: f64,
    pub status: DepartmentStatus,
    pub description: Option<String>,
    pub rooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area: Option<f64>,
    pub image_url: Option<String>,
    pub has_terrace: bool,
    pub has_balcony: bool,
    pub sea_view: bool,
    pub parking: bool,
    pub furnished: bool,
}

impl DepartmentDraft {
    pub fn validate(mut self) -> Result<Self, String> {
        self.title = self.title.trim().to_string();
        self.address = self.address.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        if !self.price.is_finite() || self.price <= 0.0 {
            return Err("The price must be greater than 0".into());
        }
        if self.title.is_empty() || self.address.is_empty() {
            return Err("Title and address are required".into());
        }
        if self.rooms.map_or(false, |r| r < 0) || self.bathrooms.map_or(false, |b| b < 0) {
            return Err("Rooms and bathrooms cannot be negative".into());
        }
        if let Some(area) = self.area {
            if !area.is_finite() || area <= 0.0 {
                return Err("The area must be greater than 0".into());
            }
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepartmentFilters {
    pub has_terrace: bool,
    pub has_balcony: bool,
    pub sea_view: bool,
    pub parking: bool,
    pub furnished: bool,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rooms: Option<i32>,
    pub max_rooms: Option<i32>,
}

/// Raw catalog query string, every field as typed by the visitor.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct CatalogQuery {
    pub has_terrace: Option<String>,
    pub has_balcony: Option<String>,
    pub sea_view: Option<String>,
    pub parking: Option<String>,
    pub furnished: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_rooms: Option<String>,
    pub max_rooms: Option<String>,
}

impl DepartmentFilters {
    /// Flags are only on for the literal value `1`; bounds that do not parse are dropped.
    pub fn from_query(query: &CatalogQuery) -> Self {
        fn flag(value: &Option<String>) -> bool {
            value.as_deref() == Some("1")
        }
        fn number<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
            value.as_deref().and_then(|v| v.trim().parse().ok())
        }
        Self {
            has_terrace: flag(&query.has_terrace),
            has_balcony: flag(&query.has_balcony),
            sea_view: flag(&query.sea_view),
            parking: flag(&query.parking),
            furnished: flag(&query.furnished),
            min_price: number::<f64>(&query.min_price).filter(|p| p.is_finite()),
            max_price: number::<f64>(&query.max_price).filter(|p| p.is_finite()),
            min_rooms: number(&query.min_rooms),
            max_rooms: number(&query.max_rooms),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == DepartmentFilters::default()
    }
}
