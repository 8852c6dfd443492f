use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed job category taxonomy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Technology,
    Marketing,
    Sales,
    Design,
    Finance,
    #[serde(rename = "HR")]
    Hr,
    Operations,
    #[serde(rename = "Customer Service")]
    CustomerService,
    Product,
    #[default]
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technology => "Technology",
            Category::Marketing => "Marketing",
            Category::Sales => "Sales",
            Category::Design => "Design",
            Category::Finance => "Finance",
            Category::Hr => "HR",
            Category::Operations => "Operations",
            Category::CustomerService => "Customer Service",
            Category::Product => "Product",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "technology" => Ok(Category::Technology),
            "marketing" => Ok(Category::Marketing),
            "sales" => Ok(Category::Sales),
            "design" => Ok(Category::Design),
            "finance" => Ok(Category::Finance),
            "hr" => Ok(Category::Hr),
            "operations" => Ok(Category::Operations),
            "customer service" => Ok(Category::CustomerService),
            "product" => Ok(Category::Product),
            "general" => Ok(Category::General),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Normalized employment type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentType {
    #[default]
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Internship,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "Full-time",
            EmploymentType::PartTime => "Part-time",
            EmploymentType::Contract => "Contract",
            EmploymentType::Internship => "Internship",
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EmploymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full-time" => Ok(EmploymentType::FullTime),
            "part-time" => Ok(EmploymentType::PartTime),
            "contract" => Ok(EmploymentType::Contract),
            "internship" => Ok(EmploymentType::Internship),
            _ => Err(format!("Unknown employment type: {}", s)),
        }
    }
}

/// Normalized seniority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[serde(rename = "Entry Level")]
    EntryLevel,
    #[default]
    #[serde(rename = "Mid Level")]
    MidLevel,
    Senior,
    Internship,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::EntryLevel => "Entry Level",
            ExperienceLevel::MidLevel => "Mid Level",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Internship => "Internship",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "entry level" => Ok(ExperienceLevel::EntryLevel),
            "mid level" => Ok(ExperienceLevel::MidLevel),
            "senior" => Ok(ExperienceLevel::Senior),
            "internship" => Ok(ExperienceLevel::Internship),
            _ => Err(format!("Unknown experience level: {}", s)),
        }
    }
}
