use crate::models::registration::RegistrationWithUser;
use anyhow::anyhow;
use csv::Writer;

/// Renders registrations (with user identity) as a CSV document for the
/// admin export endpoint.
pub fn registrations_to_csv(rows: &[RegistrationWithUser]) -> anyhow::Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record([
        "Name",
        "Email",
        "Address",
        "City",
        "State",
        "Pincode",
        "Cause",
        "RegisteredAt",
    ])?;

    for row in rows {
        let registered_at = row.registration.created_at.to_rfc3339();
        writer.write_record([
            row.fullname.as_str(),
            row.email.as_str(),
            row.registration.address.as_deref().unwrap_or(""),
            row.registration.city.as_deref().unwrap_or(""),
            row.registration.state.as_deref().unwrap_or(""),
            row.registration.pincode.as_deref().unwrap_or(""),
            row.registration.cause.as_deref().unwrap_or(""),
            registered_at.as_str(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| anyhow!("{e}"))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::registration::Registration;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn header_plus_one_row_per_registration() {
        let now = Utc::now();
        let rows = vec![RegistrationWithUser {
            registration: Registration {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                address: Some("12 Temple Rd".to_string()),
                city: Some("Colombo".to_string()),
                state: None,
                pincode: None,
                cause: Some("Education".to_string()),
                created_at: now,
                updated_at: now,
            },
            fullname: "Amara Silva".to_string(),
            email: "amara@example.org".to_string(),
        }];

        let csv = registrations_to_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "Name,Email,Address,City,State,Pincode,Cause,RegisteredAt"
        );
        assert!(lines[1].starts_with("Amara Silva,amara@example.org,12 Temple Rd,Colombo,,,"));
    }

    #[test]
    fn empty_export_is_just_the_header() {
        let csv = registrations_to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
