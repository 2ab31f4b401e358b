use std::time;

pub static TIMEOUT: time::Duration = time::Duration::from_secs(5);

pub static SCRATCH: &str = "kzUXL7HyS5OjLcU8";

pub static EMAIL_HELLO: &[u8] = b"Subject: hi\r\n\r\nBody text";

pub static EMAIL_ALTERNATIVE: &[u8] = b"Date: Sat, 8 Jul 2023 07:14:29 +0200\r
From: Bob Robert <bob@example.tld>\r
To: Alice Malice <alice@example.tld>\r
Subject: alternative\r
MIME-Version: 1.0\r
Content-Type: multipart/alternative;\r
 boundary=\"b1_e376dc71bafc953c0b0fdeb9983a9956\"\r
Content-Transfer-Encoding: 7bit\r
\r
This is a multi-part message in MIME format.\r
\r
--b1_e376dc71bafc953c0b0fdeb9983a9956\r
Content-Type: text/plain; charset=utf-8\r
\r
GZ\r
\r
--b1_e376dc71bafc953c0b0fdeb9983a9956\r
Content-Type: text/html; charset=us-ascii\r
\r
<strong>GZ</strong>\r
\r
--b1_e376dc71bafc953c0b0fdeb9983a9956--\r
";

/// The fake server refuses to store any message containing this marker
pub static EMAIL_REFUSED: &[u8] = b"Subject: refused\r\n\r\nREJECT-ME\r\n";

pub static EMAIL_LAST: &[u8] = b"Subject: last one\r\n\r\nbye\r\n";
