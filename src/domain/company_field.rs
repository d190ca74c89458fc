/// One attribute of a company profile.
///
/// Every place that lays out company data (prompts, spreadsheet header, SQL
/// column list) iterates [`CompanyField::ALL`] so the order never diverges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompanyField {
    CompanyName,
    CompanyWebsite,
    CompanyDescription,
    CompanyEmail,
    CompanyPhone,
    CompanyAddress,
    CountryRegion,
    EstablishTime,
    EmployeeCount,
    CompanyType,
    Revenue3Years,
    GoogleMapsLink,
    ContactName,
    ContactPosition,
    ContactEmail,
    ContactPhone,
    ContactLinkedin,
    ContactTwitter,
    ContactFacebook,
    DataSource,
    DataTime,
    Remarks,
}

impl CompanyField {
    pub const ALL: [CompanyField; 22] = [
        CompanyField::CompanyName,
        CompanyField::CompanyWebsite,
        CompanyField::CompanyDescription,
        CompanyField::CompanyEmail,
        CompanyField::CompanyPhone,
        CompanyField::CompanyAddress,
        CompanyField::CountryRegion,
        CompanyField::EstablishTime,
        CompanyField::EmployeeCount,
        CompanyField::CompanyType,
        CompanyField::Revenue3Years,
        CompanyField::GoogleMapsLink,
        CompanyField::ContactName,
        CompanyField::ContactPosition,
        CompanyField::ContactEmail,
        CompanyField::ContactPhone,
        CompanyField::ContactLinkedin,
        CompanyField::ContactTwitter,
        CompanyField::ContactFacebook,
        CompanyField::DataSource,
        CompanyField::DataTime,
        CompanyField::Remarks,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CompanyField::CompanyName => "Company Name",
            CompanyField::CompanyWebsite => "Company Website",
            CompanyField::CompanyDescription => "Company Description",
            CompanyField::CompanyEmail => "Company Email",
            CompanyField::CompanyPhone => "Company Phone",
            CompanyField::CompanyAddress => "Company Address",
            CompanyField::CountryRegion => "Country/Region",
            CompanyField::EstablishTime => "Established",
            CompanyField::EmployeeCount => "Employee Count",
            CompanyField::CompanyType => "Company Type",
            CompanyField::Revenue3Years => "Revenue (Last 3 Years)",
            CompanyField::GoogleMapsLink => "Google Maps Link",
            CompanyField::ContactName => "Contact Name",
            CompanyField::ContactPosition => "Contact Position",
            CompanyField::ContactEmail => "Contact Email",
            CompanyField::ContactPhone => "Contact Phone",
            CompanyField::ContactLinkedin => "Contact LinkedIn",
            CompanyField::ContactTwitter => "Contact Twitter",
            CompanyField::ContactFacebook => "Contact Facebook",
            CompanyField::DataSource => "Data Source",
            CompanyField::DataTime => "Data Time",
            CompanyField::Remarks => "Remarks",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            CompanyField::CompanyName => "company_name",
            CompanyField::CompanyWebsite => "company_website",
            CompanyField::CompanyDescription => "company_desc",
            CompanyField::CompanyEmail => "company_email",
            CompanyField::CompanyPhone => "company_phone",
            CompanyField::CompanyAddress => "company_address",
            CompanyField::CountryRegion => "country_region",
            CompanyField::EstablishTime => "establish_time",
            CompanyField::EmployeeCount => "employee_count",
            CompanyField::CompanyType => "company_type",
            CompanyField::Revenue3Years => "revenue_3years",
            CompanyField::GoogleMapsLink => "google_maps_link",
            CompanyField::ContactName => "contact_name",
            CompanyField::ContactPosition => "contact_position",
            CompanyField::ContactEmail => "contact_email",
            CompanyField::ContactPhone => "contact_phone",
            CompanyField::ContactLinkedin => "contact_linkedin",
            CompanyField::ContactTwitter => "contact_twitter",
            CompanyField::ContactFacebook => "contact_facebook",
            CompanyField::DataSource => "data_source",
            CompanyField::DataTime => "data_time",
            CompanyField::Remarks => "remarks",
        }
    }

    pub fn from_label(label: &str) -> Option<CompanyField> {
        let label = label.trim();
        CompanyField::ALL.into_iter().find(|f| f.label() == label)
    }

    pub fn from_column(column: &str) -> Option<CompanyField> {
        let column = column.trim();
        CompanyField::ALL.into_iter().find(|f| f.column() == column)
    }

    pub fn from_key(key: &str) -> Option<CompanyField> {
        CompanyField::from_label(key).or_else(|| CompanyField::from_column(key))
    }
}

pub fn labels() -> Vec<&'static str> {
    CompanyField::ALL.iter().map(|f| f.label()).collect()
}

pub fn columns() -> Vec<&'static str> {
    CompanyField::ALL.iter().map(|f| f.column()).collect()
}
