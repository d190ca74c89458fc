use crate::{
    configuration::LlmSettings,
    domain::{labels, UNKNOWN},
};

#[derive(Debug, Clone)]
pub struct Prompts {
    pub currency: String,
    pub reference_year: i32,
}

impl From<&LlmSettings> for Prompts {
    fn from(settings: &LlmSettings) -> Self {
        Prompts {
            currency: settings.currency.clone(),
            reference_year: settings.reference_year,
        }
    }
}

impl Prompts {
    pub fn company_profile(&self) -> String {
        format!(
            r#"Analyse the page carefully and extract the following information as JSON.

1. Company basics:
- Company Name: the full legal name
- Company Website: the official website URL
- Company Description: a short business description (50-100 words)
- Company Type: e.g. private, state-owned, listed
- Established: the founding date, preferably as YYYY-MM-DD
- Employee Count: the most recent figure

2. Contact details:
- Company Email: the official contact email
- Company Phone: the full number including the international prefix
- Company Address: the full office address
- Google Maps Link: if present

3. Main contact person:
- name, position, work email, direct phone
- LinkedIn / Twitter / Facebook profile links

4. Other:
- Country/Region: where the headquarters is
- Revenue (Last 3 Years): listed per year, if available
- Remarks: anything else worth noting

Rules:
1. If a value cannot be found, use "{unknown}".
2. Prefer official sources on the page.
3. Distinguish headquarters from branch offices.
4. Convert all amounts to {currency}.

Return a single JSON object with exactly these keys:
{keys}

Return only the JSON object, nothing else."#,
            unknown = UNKNOWN,
            currency = self.currency,
            keys = labels().join(", "),
        )
    }

    pub fn revenue(&self) -> String {
        let years: Vec<i32> = (1..=3).rev().map(|n| self.reference_year - n).collect();
        format!(
            r#"Extract the company's revenue for the last three years, formatted as:
"{y0}: XXX; {y1}: XXX; {y2}: XXX"
If not all three years are available, return the years you can find.
Convert all amounts to {currency}.
Return only this string, nothing else.
The current year is {reference_year}."#,
            y0 = years[0],
            y1 = years[1],
            y2 = years[2],
            currency = self.currency,
            reference_year = self.reference_year,
        )
    }
}

pub fn financial_search_query(company_name: &str) -> String {
    format!(
        r#""{}" AND ("revenue" OR "sales" OR "turnover" OR "financial results") AND ("annual report" OR "financial report" OR "investor relations") -job -career -forum -blog"#,
        company_name.trim()
    )
}
