use time::Date;

/// Whole years between `dob` and `today`, calendar-exact at the birthday.
pub fn age_on(dob: Date, today: Date) -> i32 {
    let before_birthday = (today.month() as u8, today.day()) < (dob.month() as u8, dob.day());
    today.year() - dob.year() - i32::from(before_birthday)
}

/// Body-mass index rounded to one decimal; `None` if either input is missing or zero.
pub fn bmi(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<f64> {
    let weight = weight_kg.filter(|w| *w > 0.0)?;
    let height_m = height_cm.filter(|h| *h > 0.0)? / 100.0;
    Some((weight / (height_m * height_m) * 10.0).round() / 10.0)
}
