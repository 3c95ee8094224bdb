//! Deterministic response templates
//!
//! Financial facts must never depend on what a generative model chose
//! to say. Every data-bearing reply is rendered here from store values
//! alone, in all three supported languages. The dialog stage applies
//! these over generated text whenever backing data is present.

use crate::models::{Language, TransactionRecord};

/// Format an amount with thousands grouping and two decimals
pub fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let fixed = format!("{:.2}", value.abs());
    let (whole, decimals) = match fixed.split_once('.') {
        Some(parts) => parts,
        None => (fixed.as_str(), "00"),
    };

    let digits: Vec<char> = whole.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*digit);
    }

    if negative {
        format!("-{}.{}", grouped, decimals)
    } else {
        format!("{}.{}", grouped, decimals)
    }
}

pub fn login_message(language: Language) -> &'static str {
    match language {
        Language::En => "Please log in to access your account information.",
        Language::Hi => "कृपया अपनी खाता जानकारी तक पहुंचने के लिए लॉगिन करें।",
        Language::Gu => "કૃપા કરીને તમારી ખાતા માહિતી મેળવવા માટે લૉગિન કરો.",
    }
}

pub fn generic_greeting(language: Language, name: &str) -> String {
    match language {
        Language::En => format!("Hello {}, I'm here to help with your banking needs.", name),
        Language::Hi => format!(
            "नमस्ते {}, मैं आपकी बैंकिंग जरूरतों में मदद के लिए यहां हूं।",
            name
        ),
        Language::Gu => format!(
            "નમસ્તે {}, હું તમારી બેન્કિંગ જરૂરિયાતોમાં મદદ કરવા અહીં છું.",
            name
        ),
    }
}

pub fn balance_reply(language: Language, name: &str, balance: f64, account: &str) -> String {
    let balance = format_amount(balance);
    match language {
        Language::En => format!(
            "Hello {}, your current account balance is ₹{}. Account number: {}. Is there anything else I can help you with?",
            name, balance, account
        ),
        Language::Hi => format!(
            "नमस्ते {}, आपका वर्तमान खाता बैलेंस ₹{} है। खाता संख्या {}। क्या मैं आपकी और कोई मदद कर सकता हूं?",
            name, balance, account
        ),
        Language::Gu => format!(
            "નમસ્તે {}, તમારું વર્તમાન ખાતા બેલેન્સ ₹{} છે. ખાતા નંબર {}. શું હું તમને બીજી કોઈ મદદ કરી શકું?",
            name, balance, account
        ),
    }
}

pub fn transactions_reply(language: Language, name: &str, records: &[TransactionRecord]) -> String {
    let listed: Vec<String> = records
        .iter()
        .take(3)
        .enumerate()
        .map(|(i, t)| {
            format!(
                "{}. {} - {} ₹{} - {}",
                i + 1,
                t.date,
                t.kind.as_str().to_uppercase(),
                format_amount(t.amount.abs()),
                t.description
            )
        })
        .collect();
    let listed = listed.join("\n");

    match language {
        Language::En => format!(
            "Hello {}, here are your recent transactions:\n{}\nWould you like more details?",
            name, listed
        ),
        Language::Hi => format!(
            "नमस्ते {}, यहां आपके हाल के लेनदेन हैं:\n{}\nक्या आप और विवरण चाहते हैं?",
            name, listed
        ),
        Language::Gu => format!(
            "નમસ્તે {}, અહીં તમારા તાજેતરના વ્યવહારો છે:\n{}\nશું તમને વધુ વિગતો જોઈએ છે?",
            name, listed
        ),
    }
}

pub fn loan_reply(language: Language, name: &str, loan_balance: f64, interest_rate: f64) -> String {
    let loan_balance = format_amount(loan_balance);
    match language {
        Language::En => format!(
            "Hello {}, your loan balance is ₹{} with an interest rate of {}%. Is there anything else I can help you with?",
            name, loan_balance, interest_rate
        ),
        Language::Hi => format!(
            "नमस्ते {}, आपका लोन बैलेंस ₹{} है और ब्याज दर {}% है। क्या मैं आपकी और कोई मदद कर सकता हूं?",
            name, loan_balance, interest_rate
        ),
        Language::Gu => format!(
            "નમસ્તે {}, તમારું લોન બેલેન્સ ₹{} છે અને વ્યાજ દર {}% છે. શું હું તમને બીજી કોઈ મદદ કરી શકું?",
            name, loan_balance, interest_rate
        ),
    }
}

pub fn credit_reply(language: Language, name: &str, credit_limit: f64) -> String {
    let credit_limit = format_amount(credit_limit);
    match language {
        Language::En => format!(
            "Hello {}, your credit limit is ₹{}. Is there anything else I can help you with?",
            name, credit_limit
        ),
        Language::Hi => format!(
            "नमस्ते {}, आपकी क्रेडिट लिमिट ₹{} है। क्या मैं आपकी और कोई मदद कर सकता हूं?",
            name, credit_limit
        ),
        Language::Gu => format!(
            "નમસ્તે {}, તમારી ક્રેડિટ લિમિટ ₹{} છે. શું હું તમને બીજી કોઈ મદદ કરી શકું?",
            name, credit_limit
        ),
    }
}

pub fn transfer_success_reply(
    language: Language,
    name: &str,
    amount: f64,
    recipient_name: &str,
    new_balance: f64,
    recipient_account: &str,
) -> String {
    let amount = format_amount(amount);
    let new_balance = format_amount(new_balance);
    match language {
        Language::En => format!(
            "✅ Success! {}, ₹{} has been transferred to {}. Your new balance: ₹{}. Recipient account: {}.",
            name, amount, recipient_name, new_balance, recipient_account
        ),
        Language::Hi => format!(
            "✅ सफल! {}, ₹{} {} को ट्रांसफर कर दिया गया है। आपका नया बैलेंस: ₹{}। प्राप्तकर्ता खाता: {}।",
            name, amount, recipient_name, new_balance, recipient_account
        ),
        Language::Gu => format!(
            "✅ સફળ! {}, ₹{} {} ને ટ્રાન્સફર કરવામાં આવ્યા છે. તમારું નવું બેલેન્સ: ₹{}. પ્રાપ્તકર્તા ખાતું: {}.",
            name, amount, recipient_name, new_balance, recipient_account
        ),
    }
}

pub fn recipient_not_found_reply(language: Language, name: &str) -> String {
    match language {
        Language::En => format!(
            "Sorry {}, recipient not found. Please check the recipient name and try again.",
            name
        ),
        Language::Hi => format!(
            "क्षमा करें {}, प्राप्तकर्ता नहीं मिला। कृपया सही नाम दोबारा जांचें।",
            name
        ),
        Language::Gu => format!(
            "માફ કરશો {}, પ્રાપ્તકર્તા મળ્યો નહીં. કૃપા કરીને સાચું નામ ફરીથી તપાસો.",
            name
        ),
    }
}

pub fn insufficient_balance_reply(language: Language, name: &str, current_balance: f64) -> String {
    let current_balance = format_amount(current_balance);
    match language {
        Language::En => format!(
            "Sorry {}, insufficient balance. Your current balance is ₹{}.",
            name, current_balance
        ),
        Language::Hi => format!(
            "क्षमा करें {}, आपका बैलेंस अपर्याप्त है। वर्तमान बैलेंस: ₹{}।",
            name, current_balance
        ),
        Language::Gu => format!(
            "માફ કરશો {}, તમારું બેલેન્સ અપૂરતું છે. વર્તમાન બેલેન્સ: ₹{}.",
            name, current_balance
        ),
    }
}

pub fn transfer_failed_reply(language: Language, name: &str) -> String {
    match language {
        Language::En => format!("Sorry {}, transfer failed. Please try again.", name),
        Language::Hi => format!(
            "क्षमा करें {}, ट्रांसफर नहीं हो सका। कृपया दोबारा कोशिश करें।",
            name
        ),
        Language::Gu => format!(
            "માફ કરશો {}, ટ્રાન્સફર થઈ શક્યું નહીં. કૃપા કરીને ફરી પ્રયાસ કરો.",
            name
        ),
    }
}
